use anyhow::Result;

use rfcdesk::models::Rfc;
use rfcdesk::view::{status_label, Progress};

use super::Desk;

pub fn run(desk: &Desk, id: &str) -> Result<()> {
    let rfc = desk.get_rfc(id)?;
    print!("{}", render(&rfc));
    Ok(())
}

fn render(rfc: &Rfc) -> String {
    let mut out = String::new();
    let progress = Progress::of(rfc);

    out.push_str(&format!("{}: {}\n", rfc.id, rfc.title));
    out.push_str(&format!("Status: {} ({})\n", status_label(rfc), rfc.status));
    out.push_str(&format!("Priority: {}\n", rfc.priority));
    out.push_str(&format!(
        "Progress: {}/{} ({:.0}%)\n",
        progress.completed,
        progress.total,
        progress.percent()
    ));
    out.push_str(&format!("Requestor: {}\n", rfc.requestor));
    if !rfc.category.is_empty() {
        out.push_str(&format!("Category: {}\n", rfc.category));
    }
    if !rfc.department.is_empty() {
        out.push_str(&format!("Department: {}\n", rfc.department));
    }
    if !rfc.application.is_empty() {
        out.push_str(&format!("Application: {}\n", rfc.application));
    }
    if let Some(pic) = rfc.assigned_pic() {
        out.push_str(&format!("PIC: {}\n", pic));
    }
    if rfc.signed {
        out.push_str("Signature: signed\n");
    } else if rfc.needs_signature {
        out.push_str("Signature: pending (TTE required)\n");
    }
    out.push_str(&format!(
        "Created: {}\n",
        rfc.created_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!(
        "Updated: {}\n",
        rfc.last_updated.format("%Y-%m-%d %H:%M:%S")
    ));

    let assessments = [
        ("Impact", rfc.impact_level),
        ("Complexity", rfc.technical_complexity),
        ("Risk", rfc.risk_level),
    ];
    for (name, level) in assessments {
        if let Some(level) = level {
            out.push_str(&format!("{}: {}\n", name, level));
        }
    }

    for (heading, text) in [
        ("Description", &rfc.description),
        ("Reason", &rfc.reason),
        ("Impact", &rfc.impact_description),
    ] {
        if !text.is_empty() {
            out.push_str(&format!("\n{}:\n", heading));
            for line in text.lines() {
                out.push_str(&format!("  {}\n", line));
            }
        }
    }

    if !rfc.attachments.is_empty() {
        out.push_str(&format!("\nAttachments: {}\n", rfc.attachments.join(", ")));
    }
    if !rfc.stakeholders.is_empty() {
        out.push_str(&format!("Stakeholders: {}\n", rfc.stakeholders.join(", ")));
    }

    if !rfc.timeline.is_empty() {
        out.push_str("\nTimeline:\n");
        for step in &rfc.timeline {
            let mark = if step.completed { "[x]" } else { "[ ]" };
            let date = step
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "pending".to_string());
            out.push_str(&format!("  {} {} ({})", mark, step.label, date));
            if let Some(who) = &step.assignee {
                out.push_str(&format!(" - {}", who));
            }
            if let Some(est) = &step.estimated_duration {
                out.push_str(&format!(" [{}]", est));
            }
            out.push('\n');
            if let Some(notes) = &step.notes {
                out.push_str(&format!("      {}\n", notes));
            }
        }
    }

    if let Some(sprint) = &rfc.sprint {
        out.push_str(&format!(
            "\nSprint: {} (from {}, {})\n",
            sprint.name, sprint.start_date, sprint.duration
        ));
        out.push_str(&format!("  Goal: {}\n", sprint.goal));
        out.push_str(&format!("  Team: {}\n", sprint.team.join(", ")));
    }

    if !rfc.comments.is_empty() {
        out.push_str("\nComments:\n");
        for comment in &rfc.comments {
            out.push_str(&format!(
                "  [{}] {}: {}\n",
                comment.created_at.format("%Y-%m-%d %H:%M"),
                comment.author,
                comment.message
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{assigned, client, setup_test_desk, submitted};

    #[test]
    fn test_show_existing() {
        let (mut desk, _dir) = setup_test_desk();
        let id = submitted(&mut desk, "fitur_baru");
        assert!(run(&desk, &id).is_ok());
    }

    #[test]
    fn test_show_nonexistent() {
        let (desk, _dir) = setup_test_desk();
        let result = run(&desk, "RFC-2025-999");
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_render_submitted() {
        let (mut desk, _dir) = setup_test_desk();
        let id = submitted(&mut desk, "fitur_baru");
        desk.add_comment(&id, &client(), "Urgent for March").unwrap();

        let text = render(&desk.get_rfc(&id).unwrap());
        assert!(text.starts_with(&format!("{}: Test Feature\n", id)));
        assert!(text.contains("Status: In Progress (Submitted)"));
        assert!(text.contains("Progress: 1/5 (20%)"));
        assert!(text.contains("[x] Submitted"));
        assert!(text.contains("Budi Santoso: Urgent for March"));
    }

    #[test]
    fn test_render_pending_signature() {
        let (mut desk, _dir) = setup_test_desk();
        let id = assigned(&mut desk, "integrasi");

        let text = render(&desk.get_rfc(&id).unwrap());
        assert!(text.contains("Status: Needs Signature"));
        assert!(text.contains("PIC: Danu"));
        assert!(text.contains("Signature: pending"));
        assert!(text.contains("[ ] TTE Required (pending) - Direktur"));
    }
}
