use anyhow::Result;

use rfcdesk::models::{Priority, Rfc};
use rfcdesk::view::{status_label, Progress, SortKey, StatusFilter};

use super::Desk;

pub fn run(
    desk: &Desk,
    status: StatusFilter,
    priority: Option<Priority>,
    sort: SortKey,
) -> Result<()> {
    let rfcs = desk.list_rfcs(status, priority, sort)?;

    if rfcs.is_empty() {
        println!("No RFCs found.");
        return Ok(());
    }

    for rfc in &rfcs {
        println!("{}", row(rfc));
    }

    Ok(())
}

fn row(rfc: &Rfc) -> String {
    let label = format!("[{}]", status_label(rfc));
    format!(
        "{:<13} {:<17} {:<40} {:<6} {:>4.0}% {}",
        rfc.id,
        label,
        truncate(&rfc.title, 40),
        rfc.priority.keyword(),
        Progress::of(rfc).percent(),
        rfc.last_updated.format("%Y-%m-%d")
    )
}

fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{assigned, setup_test_desk, submitted};
    use proptest::prelude::*;

    #[test]
    fn test_list_empty() {
        let (desk, _dir) = setup_test_desk();
        assert!(run(&desk, StatusFilter::All, None, SortKey::Date).is_ok());
    }

    #[test]
    fn test_list_with_filters() {
        let (mut desk, _dir) = setup_test_desk();
        submitted(&mut desk, "fitur_baru");
        assigned(&mut desk, "integrasi");

        assert!(run(&desk, StatusFilter::NeedsSignature, None, SortKey::Priority).is_ok());
        assert!(run(&desk, StatusFilter::All, Some(Priority::High), SortKey::Status).is_ok());
    }

    #[test]
    fn test_row_shows_label_and_progress() {
        let (mut desk, _dir) = setup_test_desk();
        let id = submitted(&mut desk, "fitur_baru");
        let line = row(&desk.get_rfc(&id).unwrap());
        assert!(line.starts_with(&id));
        assert!(line.contains("[In Progress]"));
        assert!(line.contains("Medium"));
        assert!(line.contains("20%"));
    }

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long() {
        assert_eq!(
            truncate("Export data pegawai ke Excel secara otomatis", 20),
            "Export data pegaw..."
        );
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate("ééééééééééé", 5), "éé...");
    }

    proptest! {
        #[test]
        fn prop_truncate_bounded(s in "\\PC{0,80}", max in 4usize..50) {
            let out = truncate(&s, max);
            prop_assert!(out.chars().count() <= max);
        }
    }
}
