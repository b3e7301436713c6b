#![no_main]

//! Drives random command sequences through the engine.
//!
//! Refused commands must leave the record untouched, history must only grow,
//! and the record invariants must hold after every step.

use arbitrary::Arbitrary;
use chrono::{NaiveDate, TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

use rfcdesk::clock::FixedClock;
use rfcdesk::command::{Command, NewRfc, PicAssignment, Review, RfcPatch};
use rfcdesk::engine::{invariant_violations, Engine, Policy};
use rfcdesk::models::{Actor, Level, Priority, Role, SprintPlan, SprintTask};
use rfcdesk::store::MemoryStore;

#[derive(Arbitrary, Debug)]
enum Action {
    SubmitDraft,
    Update(Option<String>),
    Approve(Option<String>),
    Reject(String),
    RequestModification(String),
    Resubmit(Option<String>),
    Assign(String, bool),
    Sprint { team: Vec<String>, tasks: Vec<(String, String)> },
    Progress(Option<String>),
    Sign(String),
    Comment(String),
}

#[derive(Arbitrary, Debug)]
struct LifecycleInput {
    draft: bool,
    title: String,
    category: String,
    steps: Vec<(u8, Action)>,
}

fn command(action: Action) -> Command {
    match action {
        Action::SubmitDraft => Command::SubmitDraft,
        Action::Update(title) => Command::Update {
            patch: RfcPatch {
                title,
                ..Default::default()
            },
        },
        Action::Approve(notes) => Command::Approve {
            review: Review {
                technical_complexity: Some(Level::Medium),
                risk_level: None,
                notes,
            },
        },
        Action::Reject(reason) => Command::Reject { reason },
        Action::RequestModification(reason) => Command::RequestModification { reason },
        Action::Resubmit(title) => Command::Resubmit {
            patch: RfcPatch {
                title,
                ..Default::default()
            },
        },
        Action::Assign(pic, high) => Command::AssignPic {
            assignment: PicAssignment {
                pic,
                priority: high.then_some(Priority::High),
                target_timeline: None,
                notes: None,
            },
        },
        Action::Sprint { team, tasks } => Command::CreateSprint {
            plan: SprintPlan {
                name: "Sprint".to_string(),
                start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap_or_default(),
                duration: "1 week".to_string(),
                goal: "Fuzz".to_string(),
                team,
                tasks: tasks
                    .into_iter()
                    .take(8)
                    .map(|(description, estimate)| SprintTask {
                        description,
                        estimate,
                        priority: Priority::Medium,
                        assignee: None,
                    })
                    .collect(),
            },
        },
        Action::Progress(notes) => Command::CompleteStep { notes },
        Action::Sign(passkey) => Command::CompleteSignature { passkey },
        Action::Comment(message) => Command::Comment { message },
    }
}

fuzz_target!(|input: LifecycleInput| {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 8, 10, 0, 0).unwrap());
    let mut engine = Engine::with_clock(MemoryStore::new(), &clock, Policy::default());

    let form = NewRfc {
        title: input.title,
        description: "fuzz".to_string(),
        category: input.category,
        reason: "fuzz".to_string(),
        impact_level: Some(Level::Low),
        impact_description: "fuzz".to_string(),
        ..Default::default()
    };
    let client = Actor::new("Client", Role::Client);
    let created = if input.draft {
        engine.save_draft(&client, form)
    } else {
        engine.submit_rfc(&client, form)
    };
    let Ok(rfc) = created else { return };

    for (who, action) in input.steps.into_iter().take(64) {
        let role = Role::ALL[who as usize % Role::ALL.len()];
        let actor = Actor::new(role.to_string(), role);
        let before = engine.get_rfc(&rfc.id).unwrap();

        let result = engine.apply(&rfc.id, &actor, command(action));
        let after = engine.get_rfc(&rfc.id).unwrap();

        match result {
            Ok(returned) => assert_eq!(returned, after),
            Err(_) => assert_eq!(before, after),
        }
        assert!(after.timeline.len() >= before.timeline.len());
        assert!(after.comments.starts_with(&before.comments));
        assert!(after.version >= before.version);

        let violations = invariant_violations(&after);
        assert!(violations.is_empty(), "{:?}", violations);
    }
});
