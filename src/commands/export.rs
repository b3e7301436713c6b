use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};

use rfcdesk::models::Rfc;
use rfcdesk::view::{status_label, Progress, SortKey, StatusFilter, StatusLabel};

use super::Desk;

/// Markdown section order.
const SECTIONS: [StatusLabel; 6] = [
    StatusLabel::NeedsSignature,
    StatusLabel::InProgress,
    StatusLabel::NotStarted,
    StatusLabel::ModificationRequested,
    StatusLabel::Completed,
    StatusLabel::Rejected,
];

#[derive(Serialize, Deserialize)]
pub struct ExportedRfc {
    #[serde(flatten)]
    pub rfc: Rfc,
    pub label: String,
    pub progress: f64,
}

#[derive(Serialize, Deserialize)]
pub struct ExportData {
    pub version: i32,
    pub exported_at: String,
    pub rfcs: Vec<ExportedRfc>,
}

fn export_rfc(rfc: Rfc) -> ExportedRfc {
    ExportedRfc {
        label: status_label(&rfc).to_string(),
        progress: Progress::of(&rfc).percent(),
        rfc,
    }
}

fn all(desk: &Desk) -> Result<Vec<Rfc>> {
    Ok(desk.list_rfcs(StatusFilter::All, None, SortKey::Date)?)
}

pub fn run_json(desk: &Desk, output_path: Option<&str>) -> Result<()> {
    let data = ExportData {
        version: 1,
        exported_at: chrono::Utc::now().to_rfc3339(),
        rfcs: all(desk)?.into_iter().map(export_rfc).collect(),
    };

    let json = serde_json::to_string_pretty(&data)?;

    match output_path {
        Some(path) => {
            fs::write(path, json).context("Failed to write export file")?;
            eprintln!("Exported {} RFCs to {}", data.rfcs.len(), path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

pub fn run_markdown(desk: &Desk, output_path: Option<&str>) -> Result<()> {
    let rfcs = all(desk)?;
    let mut md = String::new();

    md.push_str("# RFC Export\n\n");
    md.push_str(&format!(
        "Exported: {}\n\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for section in SECTIONS {
        let group: Vec<&Rfc> = rfcs.iter().filter(|r| status_label(r) == section).collect();
        if group.is_empty() {
            continue;
        }
        md.push_str(&format!("## {}\n\n", section));
        for rfc in group {
            write_rfc_md(&mut md, rfc);
        }
    }

    match output_path {
        Some(path) => {
            fs::write(path, md).context("Failed to write export file")?;
            eprintln!("Exported {} RFCs to {}", rfcs.len(), path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", md)?;
        }
    }
    Ok(())
}

fn write_rfc_md(md: &mut String, rfc: &Rfc) {
    let progress = Progress::of(rfc);
    let checkbox = if progress.is_complete() { "[x]" } else { "[ ]" };

    md.push_str(&format!("### {} {}: {}\n\n", checkbox, rfc.id, rfc.title));
    md.push_str(&format!("- **Priority:** {}\n", rfc.priority));
    md.push_str(&format!("- **Status:** {}\n", rfc.status));
    md.push_str(&format!("- **Progress:** {:.0}%\n", progress.percent()));
    md.push_str(&format!("- **Requestor:** {}\n", rfc.requestor));
    if let Some(pic) = rfc.assigned_pic() {
        md.push_str(&format!("- **PIC:** {}\n", pic));
    }
    md.push_str(&format!(
        "- **Created:** {}\n",
        rfc.created_at.format("%Y-%m-%d")
    ));

    if !rfc.description.is_empty() {
        md.push_str(&format!("\n{}\n", rfc.description));
    }

    if !rfc.timeline.is_empty() {
        md.push_str("\n**Timeline:**\n");
        for step in &rfc.timeline {
            let mark = if step.completed { "x" } else { " " };
            md.push_str(&format!("- [{}] {}\n", mark, step.label));
        }
    }

    if !rfc.comments.is_empty() {
        md.push_str("\n**Comments:**\n");
        for comment in &rfc.comments {
            md.push_str(&format!(
                "- [{}] {}: {}\n",
                comment.created_at.format("%Y-%m-%d %H:%M"),
                comment.author,
                comment.message
            ));
        }
    }

    md.push_str("\n---\n\n");
}
