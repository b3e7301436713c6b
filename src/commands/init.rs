use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use rfcdesk::config::{Config, CONFIG_FILE};
use rfcdesk::db::Database;

pub const WORKSPACE_DIR: &str = ".rfcdesk";
pub const DB_FILE: &str = "rfcs.db";

pub fn run(path: &Path, force: bool) -> Result<()> {
    let desk_dir = path.join(WORKSPACE_DIR);
    let desk_exists = desk_dir.exists();
    let config_path = desk_dir.join(CONFIG_FILE);

    if desk_exists && config_path.exists() && !force {
        println!("Already initialized at {}", path.display());
        println!("Use --force to reset config.json to the defaults.");
        return Ok(());
    }

    if !desk_exists {
        fs::create_dir_all(&desk_dir).context("Failed to create .rfcdesk directory")?;
        println!("Created {}", desk_dir.display());
    }

    // Opening creates the schema; existing records are kept.
    Database::open(&desk_dir.join(DB_FILE)).context("Failed to create database")?;

    Config::default().write(&desk_dir)?;
    if force && desk_exists {
        println!("Reset {} to defaults", config_path.display());
    } else {
        println!("Wrote default {}", config_path.display());
    }

    println!("rfcdesk initialized successfully!");
    println!("\nNext steps:");
    println!("  rfcdesk --role client --actor \"Your Name\" submit \"Title\" ...");
    println!("  rfcdesk list");

    Ok(())
}
