use anyhow::Result;

use rfcdesk::models::{Actor, RfcStatus};
use rfcdesk::view::Progress;

use super::Desk;

/// Mark the next open timeline step as done.
pub fn run(desk: &mut Desk, id: &str, actor: &Actor, notes: Option<&str>) -> Result<()> {
    let before = desk.get_rfc(id)?;
    let rfc = desk.complete_step(id, actor, notes)?;

    if let Some(step) = before.next_open_step().and_then(|i| rfc.timeline.get(i)) {
        println!("Completed step: {}", step.label);
    }
    let progress = Progress::of(&rfc);
    println!(
        "Progress: {}/{} ({:.0}%)",
        progress.completed,
        progress.total,
        progress.percent()
    );
    if rfc.status == RfcStatus::Completed {
        println!("{} is complete", rfc.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{assigned, kapokja, pic, setup_test_desk};
    use chrono::NaiveDate;
    use rfcdesk::models::{Priority, SprintPlan, SprintTask};

    fn in_progress(desk: &mut Desk, tasks: usize) -> String {
        let id = assigned(desk, "fitur_baru");
        let plan = SprintPlan {
            name: "Sprint 1".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            duration: "1 week".to_string(),
            goal: "Finish".to_string(),
            team: vec!["Rina".to_string()],
            tasks: (0..tasks)
                .map(|i| SprintTask {
                    description: format!("Task {}", i + 1),
                    estimate: "1d".to_string(),
                    priority: Priority::Medium,
                    assignee: None,
                })
                .collect(),
        };
        desk.create_sprint(&id, &pic(), plan).unwrap();
        id
    }

    #[test]
    fn test_progress_completes_in_order() {
        let (mut desk, _dir) = setup_test_desk();
        let id = in_progress(&mut desk, 2);

        run(&mut desk, &id, &pic(), Some("First done")).unwrap();
        let rfc = desk.get_rfc(&id).unwrap();
        let tasks: Vec<_> = rfc
            .timeline
            .iter()
            .filter(|s| s.label.starts_with("Task"))
            .collect();
        assert!(tasks[0].completed);
        assert_eq!(tasks[0].notes.as_deref(), Some("First done"));
        assert!(!tasks[1].completed);
        assert_eq!(rfc.status, RfcStatus::InProgress);
    }

    #[test]
    fn test_progress_last_step_completes_rfc() {
        let (mut desk, _dir) = setup_test_desk();
        let id = in_progress(&mut desk, 1);

        run(&mut desk, &id, &pic(), None).unwrap();
        let rfc = desk.get_rfc(&id).unwrap();
        assert_eq!(rfc.status, RfcStatus::Completed);
        assert!(Progress::of(&rfc).is_complete());

        let result = run(&mut desk, &id, &pic(), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_progress_before_sprint_fails() {
        let (mut desk, _dir) = setup_test_desk();
        let id = assigned(&mut desk, "fitur_baru");
        let result = run(&mut desk, &id, &pic(), None);
        assert!(result.unwrap_err().to_string().contains("while it is Assigned"));
    }

    #[test]
    fn test_progress_wrong_role() {
        let (mut desk, _dir) = setup_test_desk();
        let id = in_progress(&mut desk, 1);
        let result = run(&mut desk, &id, &kapokja(), None);
        assert!(result.unwrap_err().to_string().contains("may not"));
    }
}
