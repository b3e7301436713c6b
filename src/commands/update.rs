use anyhow::{bail, Result};

use rfcdesk::command::RfcPatch;
use rfcdesk::models::Actor;

use super::Desk;

pub fn run(desk: &mut Desk, id: &str, actor: &Actor, patch: RfcPatch) -> Result<()> {
    if patch.is_empty() {
        bail!("Nothing to update. Use --title, --description, --priority or another field flag");
    }

    let rfc = desk.update_rfc(id, actor, patch)?;
    println!("Updated {}", rfc.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{client, kapokja, setup_test_desk, submitted};
    use proptest::prelude::*;
    use rfcdesk::command::Review;
    use rfcdesk::models::{Priority, RfcStatus};

    fn title(t: &str) -> RfcPatch {
        RfcPatch {
            title: Some(t.to_string()),
            ..Default::default()
        }
    }

    // ==================== Unit Tests ====================

    #[test]
    fn test_update_title() {
        let (mut desk, _dir) = setup_test_desk();
        let id = submitted(&mut desk, "fitur_baru");

        run(&mut desk, &id, &client(), title("New title")).unwrap();
        assert_eq!(desk.get_rfc(&id).unwrap().title, "New title");
    }

    #[test]
    fn test_update_priority_and_attachments() {
        let (mut desk, _dir) = setup_test_desk();
        let id = submitted(&mut desk, "fitur_baru");

        let patch = RfcPatch {
            priority: Some(Priority::High),
            attachments: vec!["flow.png".to_string()],
            ..Default::default()
        };
        run(&mut desk, &id, &client(), patch).unwrap();

        let rfc = desk.get_rfc(&id).unwrap();
        assert_eq!(rfc.priority, Priority::High);
        assert_eq!(rfc.attachments, vec!["flow.png".to_string()]);
        assert_eq!(rfc.status, RfcStatus::Submitted);
    }

    #[test]
    fn test_update_nothing_fails() {
        let (mut desk, _dir) = setup_test_desk();
        let id = submitted(&mut desk, "fitur_baru");

        let result = run(&mut desk, &id, &client(), RfcPatch::default());
        assert!(result.unwrap_err().to_string().contains("Nothing to update"));
    }

    #[test]
    fn test_update_blank_title_fails() {
        let (mut desk, _dir) = setup_test_desk();
        let id = submitted(&mut desk, "fitur_baru");

        let result = run(&mut desk, &id, &client(), title("   "));
        assert!(result.unwrap_err().to_string().contains("title is required"));
        assert_eq!(desk.get_rfc(&id).unwrap().title, "Test Feature");
    }

    #[test]
    fn test_update_after_approval_fails() {
        let (mut desk, _dir) = setup_test_desk();
        let id = submitted(&mut desk, "fitur_baru");
        desk.approve_rfc(&id, &kapokja(), Review::default()).unwrap();

        let result = run(&mut desk, &id, &client(), title("Too late"));
        assert!(result.unwrap_err().to_string().contains("Cannot update"));
    }

    #[test]
    fn test_update_nonexistent() {
        let (mut desk, _dir) = setup_test_desk();
        let result = run(&mut desk, "RFC-2025-999", &client(), title("x"));
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_update_unicode_title() {
        let (mut desk, _dir) = setup_test_desk();
        let id = submitted(&mut desk, "fitur_baru");

        run(&mut desk, &id, &client(), title("Ekspor data pegawai 🎉")).unwrap();
        assert_eq!(desk.get_rfc(&id).unwrap().title, "Ekspor data pegawai 🎉");
    }

    // ==================== Property-Based Tests ====================

    proptest! {
        #[test]
        fn prop_update_title_roundtrip(new_title in "[a-zA-Z0-9][a-zA-Z0-9 ]{0,30}") {
            let (mut desk, _dir) = setup_test_desk();
            let id = submitted(&mut desk, "fitur_baru");

            run(&mut desk, &id, &client(), title(&new_title)).unwrap();
            prop_assert_eq!(desk.get_rfc(&id).unwrap().title, new_title.trim().to_string());
        }
    }
}
