use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::engine::{Policy, DEFAULT_UTC_OFFSET_MINUTES};
use crate::signature::DEFAULT_MIN_PASSKEY_LEN;

pub const CONFIG_FILE: &str = "config.json";

/// Workspace settings stored in `.rfcdesk/config.json`. Missing fields fall
/// back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub id_prefix: String,
    pub signature_categories: Vec<String>,
    pub min_passkey_len: usize,
    pub verification_delay_ms: u64,
    pub confirmation_delay_ms: u64,
    /// Local time offset used for timeline dates, e.g. 420 for WIB.
    pub utc_offset_minutes: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id_prefix: "RFC".to_string(),
            signature_categories: vec!["integrasi".to_string(), "security".to_string()],
            min_passkey_len: DEFAULT_MIN_PASSKEY_LEN,
            verification_delay_ms: 3000,
            confirmation_delay_ms: 2000,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

impl Config {
    /// Read the config from a workspace directory; a missing file means defaults.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        let path = dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn policy(&self) -> Policy {
        Policy {
            id_prefix: self.id_prefix.clone(),
            signature_categories: self.signature_categories.clone(),
            min_passkey_len: self.min_passkey_len,
            utc_offset_minutes: self.utc_offset_minutes,
        }
    }

    pub fn verification_delay(&self) -> Duration {
        Duration::from_millis(self.verification_delay_ms)
    }

    pub fn confirmation_delay(&self) -> Duration {
        Duration::from_millis(self.confirmation_delay_ms)
    }
}
