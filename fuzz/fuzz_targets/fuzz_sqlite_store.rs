#![no_main]

//! Round-trips arbitrary text through the SQLite store.
//!
//! Titles, notes and comments can hold any Unicode; whatever is written must
//! come back unchanged, and rendering helpers must not panic on it.

use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use tempfile::tempdir;

use rfcdesk::clock::FixedClock;
use rfcdesk::command::NewRfc;
use rfcdesk::db::Database;
use rfcdesk::engine::{Engine, Policy};
use rfcdesk::models::{Actor, Level, Role};
use rfcdesk::view::{status_label, Progress, SortKey, StatusFilter};

#[derive(Arbitrary, Debug)]
struct StoreInput {
    title: String,
    description: String,
    comments: Vec<String>,
    count: u8,
}

fuzz_target!(|input: StoreInput| {
    let dir = match tempdir() {
        Ok(d) => d,
        Err(_) => return,
    };
    let db = match Database::open(&dir.path().join("rfcs.db")) {
        Ok(d) => d,
        Err(_) => return,
    };
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 8, 10, 0, 0).unwrap());
    let mut engine = Engine::with_clock(db, &clock, Policy::default());
    let client = Actor::new("Client", Role::Client);

    let mut ids = Vec::new();
    for i in 0..(input.count % 8).max(1) {
        let form = NewRfc {
            title: format!("{} {}", input.title, i),
            description: input.description.clone(),
            category: "fitur_baru".to_string(),
            reason: "fuzz".to_string(),
            impact_level: Some(Level::Medium),
            impact_description: "fuzz".to_string(),
            ..Default::default()
        };
        if let Ok(rfc) = engine.submit_rfc(&client, form) {
            ids.push(rfc.id);
        }
    }

    for id in &ids {
        for message in input.comments.iter().take(8) {
            let _ = engine.add_comment(id, &client, message);
        }
        let rfc = engine.get_rfc(id).unwrap();
        assert_eq!(rfc.description, input.description);
        let _ = status_label(&rfc).to_string();
        let _ = Progress::of(&rfc).percent();
    }

    let listed = engine
        .list_rfcs(StatusFilter::All, None, SortKey::Priority)
        .unwrap();
    assert_eq!(listed.len(), ids.len());
});
