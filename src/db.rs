use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::StoreError;
use crate::models::{Comment, CommentKind, Level, Rfc, TimelineStep};
use crate::store::{Result, RfcStore};

const SCHEMA_VERSION: i32 = 1;

const RFC_COLUMNS: &str = "id, title, description, category, department, application, reason, \
     impact_description, requestor, priority, impact_level, technical_complexity, risk_level, \
     status, assignment, needs_signature, signed, sprint, attachments, stakeholders, \
     created_at, last_updated, version";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let db = Database { conn };
        db.init_schema()?;
        debug!(path = %path.display(), "opened rfc database");
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version < SCHEMA_VERSION {
            self.conn.execute_batch(
                r#"
                -- One row per RFC; nested records are stored as JSON
                CREATE TABLE IF NOT EXISTS rfcs (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    category TEXT NOT NULL DEFAULT '',
                    department TEXT NOT NULL DEFAULT '',
                    application TEXT NOT NULL DEFAULT '',
                    reason TEXT NOT NULL DEFAULT '',
                    impact_description TEXT NOT NULL DEFAULT '',
                    requestor TEXT NOT NULL,
                    priority TEXT NOT NULL DEFAULT 'medium',
                    impact_level TEXT,
                    technical_complexity TEXT,
                    risk_level TEXT,
                    status TEXT NOT NULL,
                    assignment TEXT,
                    needs_signature INTEGER NOT NULL DEFAULT 0,
                    signed INTEGER NOT NULL DEFAULT 0,
                    sprint TEXT,
                    attachments TEXT NOT NULL DEFAULT '[]',
                    stakeholders TEXT NOT NULL DEFAULT '[]',
                    created_at TEXT NOT NULL,
                    last_updated TEXT NOT NULL,
                    version INTEGER NOT NULL
                );

                -- Ordered progress steps
                CREATE TABLE IF NOT EXISTS timeline_steps (
                    rfc_id TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    label TEXT NOT NULL,
                    assignee TEXT,
                    date TEXT,
                    completed INTEGER NOT NULL DEFAULT 0,
                    estimated_duration TEXT,
                    notes TEXT,
                    PRIMARY KEY (rfc_id, position),
                    FOREIGN KEY (rfc_id) REFERENCES rfcs(id) ON DELETE CASCADE
                );

                -- Discussion, append-only
                CREATE TABLE IF NOT EXISTS comments (
                    rfc_id TEXT NOT NULL,
                    position INTEGER NOT NULL,
                    comment_id TEXT NOT NULL,
                    author TEXT NOT NULL,
                    message TEXT NOT NULL,
                    kind TEXT NOT NULL DEFAULT 'comment',
                    created_at TEXT NOT NULL,
                    PRIMARY KEY (rfc_id, position),
                    FOREIGN KEY (rfc_id) REFERENCES rfcs(id) ON DELETE CASCADE
                );

                -- Per-year id counters
                CREATE TABLE IF NOT EXISTS id_sequences (
                    year INTEGER PRIMARY KEY,
                    last_value INTEGER NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_rfcs_status ON rfcs(status);
                CREATE INDEX IF NOT EXISTS idx_rfcs_priority ON rfcs(priority);
                CREATE INDEX IF NOT EXISTS idx_timeline_rfc ON timeline_steps(rfc_id);
                CREATE INDEX IF NOT EXISTS idx_comments_rfc ON comments(rfc_id);
                "#,
            )?;

            self.conn
                .execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
            debug!(from = version, to = SCHEMA_VERSION, "migrated schema");
        }

        self.conn.execute("PRAGMA foreign_keys = ON", [])?;

        Ok(())
    }

    fn load(&self, row: RfcRow) -> Result<Rfc> {
        let timeline = load_timeline(&self.conn, &row.id)?;
        let comments = load_comments(&self.conn, &row.id)?;
        row.into_rfc(timeline, comments)
    }
}

impl RfcStore for Database {
    fn insert(&mut self, rfc: &Rfc) -> Result<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: Option<i64> = tx
            .query_row("SELECT seq FROM rfcs WHERE id = ?1", [&rfc.id], |row| {
                row.get(0)
            })
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::Duplicate(rfc.id.clone()));
        }

        tx.execute(
            "INSERT INTO rfcs (id, title, description, category, department, application, reason, \
             impact_description, requestor, priority, impact_level, technical_complexity, risk_level, \
             status, assignment, needs_signature, signed, sprint, attachments, stakeholders, \
             created_at, last_updated, version) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
             ?18, ?19, ?20, ?21, ?22, ?23)",
            params![
                rfc.id,
                rfc.title,
                rfc.description,
                rfc.category,
                rfc.department,
                rfc.application,
                rfc.reason,
                rfc.impact_description,
                rfc.requestor,
                rfc.priority.as_str(),
                rfc.impact_level.map(|l| l.as_str()),
                rfc.technical_complexity.map(|l| l.as_str()),
                rfc.risk_level.map(|l| l.as_str()),
                rfc.status.as_str(),
                to_json_opt(&rfc.assignment)?,
                rfc.needs_signature,
                rfc.signed,
                to_json_opt(&rfc.sprint)?,
                serde_json::to_string(&rfc.attachments)?,
                serde_json::to_string(&rfc.stakeholders)?,
                rfc.created_at.to_rfc3339(),
                rfc.last_updated.to_rfc3339(),
                rfc.version as i64,
            ],
        )?;

        write_timeline(&tx, rfc)?;
        append_comments(&tx, rfc, 0)?;
        tx.commit()?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Rfc>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM rfcs WHERE id = ?1", RFC_COLUMNS),
                [id],
                RfcRow::read,
            )
            .optional()?;

        row.map(|row| self.load(row)).transpose()
    }

    fn update(&mut self, rfc: &Rfc, expected_version: u64) -> Result<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let found: i64 = tx
            .query_row("SELECT version FROM rfcs WHERE id = ?1", [&rfc.id], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| StoreError::NotFound(rfc.id.clone()))?;
        let found = found as u64;
        if found != expected_version {
            return Err(StoreError::Conflict {
                id: rfc.id.clone(),
                expected: expected_version,
                found,
            });
        }

        let stored_steps: i64 = tx.query_row(
            "SELECT COUNT(*) FROM timeline_steps WHERE rfc_id = ?1",
            [&rfc.id],
            |row| row.get(0),
        )?;
        let stored_comments = load_comments(&tx, &rfc.id)?;
        if rfc.timeline.len() < stored_steps as usize || !rfc.comments.starts_with(&stored_comments)
        {
            return Err(StoreError::HistoryRewrite(rfc.id.clone()));
        }

        tx.execute(
            "UPDATE rfcs SET title = ?2, description = ?3, category = ?4, department = ?5, \
             application = ?6, reason = ?7, impact_description = ?8, priority = ?9, \
             impact_level = ?10, technical_complexity = ?11, risk_level = ?12, status = ?13, \
             assignment = ?14, needs_signature = ?15, signed = ?16, sprint = ?17, \
             attachments = ?18, stakeholders = ?19, last_updated = ?20, version = ?21 \
             WHERE id = ?1",
            params![
                rfc.id,
                rfc.title,
                rfc.description,
                rfc.category,
                rfc.department,
                rfc.application,
                rfc.reason,
                rfc.impact_description,
                rfc.priority.as_str(),
                rfc.impact_level.map(|l| l.as_str()),
                rfc.technical_complexity.map(|l| l.as_str()),
                rfc.risk_level.map(|l| l.as_str()),
                rfc.status.as_str(),
                to_json_opt(&rfc.assignment)?,
                rfc.needs_signature,
                rfc.signed,
                to_json_opt(&rfc.sprint)?,
                serde_json::to_string(&rfc.attachments)?,
                serde_json::to_string(&rfc.stakeholders)?,
                rfc.last_updated.to_rfc3339(),
                rfc.version as i64,
            ],
        )?;

        // Steps may be completed in place, so the timeline is rewritten whole.
        tx.execute("DELETE FROM timeline_steps WHERE rfc_id = ?1", [&rfc.id])?;
        write_timeline(&tx, rfc)?;
        append_comments(&tx, rfc, stored_comments.len())?;

        tx.commit()?;
        debug!(rfc = %rfc.id, version = rfc.version, "rfc row updated");
        Ok(())
    }

    fn list(&self) -> Result<Vec<Rfc>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM rfcs ORDER BY seq DESC", RFC_COLUMNS))?;

        let rows = stmt
            .query_map([], RfcRow::read)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(|row| self.load(row)).collect()
    }

    fn next_sequence(&mut self, year: i32) -> Result<u32> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO id_sequences (year, last_value) VALUES (?1, 1) \
             ON CONFLICT(year) DO UPDATE SET last_value = last_value + 1",
            params![year],
        )?;
        let value: u32 = tx.query_row(
            "SELECT last_value FROM id_sequences WHERE year = ?1",
            [year],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(value)
    }
}

/// Raw column values, converted to an [`Rfc`] outside the row callback so
/// decoding failures surface as [`StoreError::Corrupt`].
struct RfcRow {
    id: String,
    title: String,
    description: String,
    category: String,
    department: String,
    application: String,
    reason: String,
    impact_description: String,
    requestor: String,
    priority: String,
    impact_level: Option<String>,
    technical_complexity: Option<String>,
    risk_level: Option<String>,
    status: String,
    assignment: Option<String>,
    needs_signature: bool,
    signed: bool,
    sprint: Option<String>,
    attachments: String,
    stakeholders: String,
    created_at: String,
    last_updated: String,
    version: i64,
}

impl RfcRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RfcRow {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            department: row.get(4)?,
            application: row.get(5)?,
            reason: row.get(6)?,
            impact_description: row.get(7)?,
            requestor: row.get(8)?,
            priority: row.get(9)?,
            impact_level: row.get(10)?,
            technical_complexity: row.get(11)?,
            risk_level: row.get(12)?,
            status: row.get(13)?,
            assignment: row.get(14)?,
            needs_signature: row.get(15)?,
            signed: row.get(16)?,
            sprint: row.get(17)?,
            attachments: row.get(18)?,
            stakeholders: row.get(19)?,
            created_at: row.get(20)?,
            last_updated: row.get(21)?,
            version: row.get(22)?,
        })
    }

    fn into_rfc(self, timeline: Vec<TimelineStep>, comments: Vec<Comment>) -> Result<Rfc> {
        Ok(Rfc {
            priority: self.priority.parse().map_err(StoreError::Corrupt)?,
            impact_level: parse_level(self.impact_level)?,
            technical_complexity: parse_level(self.technical_complexity)?,
            risk_level: parse_level(self.risk_level)?,
            status: self.status.parse().map_err(StoreError::Corrupt)?,
            assignment: self
                .assignment
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            sprint: self.sprint.as_deref().map(serde_json::from_str).transpose()?,
            attachments: serde_json::from_str(&self.attachments)?,
            stakeholders: serde_json::from_str(&self.stakeholders)?,
            created_at: parse_datetime(&self.created_at)?,
            last_updated: parse_datetime(&self.last_updated)?,
            version: u64::try_from(self.version)
                .map_err(|_| StoreError::Corrupt(format!("negative version on {}", self.id)))?,
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            department: self.department,
            application: self.application,
            reason: self.reason,
            impact_description: self.impact_description,
            requestor: self.requestor,
            needs_signature: self.needs_signature,
            signed: self.signed,
            timeline,
            comments,
        })
    }
}

fn load_timeline(conn: &Connection, rfc_id: &str) -> Result<Vec<TimelineStep>> {
    let mut stmt = conn.prepare(
        "SELECT label, assignee, date, completed, estimated_duration, notes \
         FROM timeline_steps WHERE rfc_id = ?1 ORDER BY position",
    )?;

    let rows = stmt
        .query_map([rfc_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(
            |(label, assignee, date, completed, estimated_duration, notes)| {
                Ok(TimelineStep {
                    label,
                    assignee,
                    date: date.as_deref().map(parse_date).transpose()?,
                    completed,
                    estimated_duration,
                    notes,
                })
            },
        )
        .collect()
}

fn load_comments(conn: &Connection, rfc_id: &str) -> Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT comment_id, author, message, kind, created_at \
         FROM comments WHERE rfc_id = ?1 ORDER BY position",
    )?;

    let rows = stmt
        .query_map([rfc_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, author, message, kind, created_at)| {
            Ok(Comment {
                id,
                author,
                message,
                kind: kind.parse::<CommentKind>().map_err(StoreError::Corrupt)?,
                created_at: parse_datetime(&created_at)?,
            })
        })
        .collect()
}

fn write_timeline(conn: &Connection, rfc: &Rfc) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO timeline_steps (rfc_id, position, label, assignee, date, completed, \
         estimated_duration, notes) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for (position, step) in rfc.timeline.iter().enumerate() {
        stmt.execute(params![
            rfc.id,
            position as i64,
            step.label,
            step.assignee,
            step.date.map(|d| d.format("%Y-%m-%d").to_string()),
            step.completed,
            step.estimated_duration,
            step.notes,
        ])?;
    }
    Ok(())
}

fn append_comments(conn: &Connection, rfc: &Rfc, from: usize) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO comments (rfc_id, position, comment_id, author, message, kind, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for (position, comment) in rfc.comments.iter().enumerate().skip(from) {
        stmt.execute(params![
            rfc.id,
            position as i64,
            comment.id,
            comment.author,
            comment.message,
            comment.kind.as_str(),
            comment.created_at.to_rfc3339(),
        ])?;
    }
    Ok(())
}

fn to_json_opt<T: serde::Serialize>(value: &Option<T>) -> Result<Option<String>> {
    Ok(value.as_ref().map(serde_json::to_string).transpose()?)
}

fn parse_level(value: Option<String>) -> Result<Option<Level>> {
    value
        .map(|v| v.parse::<Level>().map_err(StoreError::Corrupt))
        .transpose()
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", s, e)))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| StoreError::Corrupt(format!("bad date '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::command::{NewRfc, PicAssignment, Review};
    use crate::engine::{Engine, Policy};
    use crate::models::{Actor, Assignment, Priority, RfcStatus, Role, SprintPlan, SprintTask};
    use crate::store::fixtures::rfc;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn setup_test_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("rfcs.db");
        let db = Database::open(&db_path).unwrap();
        (db, dir)
    }

    fn comment(id: &str, message: &str) -> Comment {
        Comment {
            id: id.to_string(),
            author: "Ika".to_string(),
            message: message.to_string(),
            kind: CommentKind::Comment,
            created_at: Utc.with_ymd_and_hms(2025, 3, 2, 8, 30, 0).unwrap(),
        }
    }

    fn full_record(id: &str) -> Rfc {
        let mut record = rfc(id);
        let day = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        record.status = RfcStatus::InProgress;
        record.priority = Priority::High;
        record.impact_level = Some(Level::High);
        record.risk_level = Some(Level::Low);
        record.attachments = vec!["mockup.pdf".to_string()];
        record.stakeholders = vec!["Bagian Kepegawaian".to_string()];
        record.assignment = Some(Assignment {
            pic: "Danu".to_string(),
            assigned_by: "Ika".to_string(),
            assigned_at: record.created_at,
            target_timeline: Some("2 weeks".to_string()),
            notes: None,
        });
        record.sprint = Some(SprintPlan {
            name: "Sprint 1".to_string(),
            start_date: day,
            duration: "2 weeks".to_string(),
            goal: "Ship it".to_string(),
            team: vec!["Rina".to_string()],
            tasks: vec![SprintTask {
                description: "Export endpoint".to_string(),
                estimate: "3d".to_string(),
                priority: Priority::High,
                assignee: None,
            }],
        });
        record.timeline = vec![
            TimelineStep::done("Submitted", "System", day, None),
            TimelineStep::planned("Export endpoint", None, Some("3d".to_string()), None),
        ];
        record.comments = vec![comment(&format!("{}-C1", id), "Looks good")];
        record
    }

    // ==================== Unit Tests ====================

    #[test]
    fn test_open_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("rfcs.db");
        {
            let mut db = Database::open(&db_path).unwrap();
            db.insert(&rfc("RFC-2025-001")).unwrap();
        }
        let db = Database::open(&db_path).unwrap();
        assert!(db.get("RFC-2025-001").unwrap().is_some());
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let (mut db, _dir) = setup_test_db();
        let record = full_record("RFC-2025-001");
        db.insert(&record).unwrap();

        let loaded = db.get("RFC-2025-001").unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_get_missing() {
        let (db, _dir) = setup_test_db();
        assert!(db.get("RFC-2025-404").unwrap().is_none());
    }

    #[test]
    fn test_insert_duplicate() {
        let (mut db, _dir) = setup_test_db();
        db.insert(&rfc("RFC-2025-001")).unwrap();
        let err = db.insert(&rfc("RFC-2025-001")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[test]
    fn test_list_newest_first() {
        let (mut db, _dir) = setup_test_db();
        for id in ["RFC-2025-001", "RFC-2025-002", "RFC-2025-003"] {
            db.insert(&rfc(id)).unwrap();
        }
        let ids: Vec<String> = db.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["RFC-2025-003", "RFC-2025-002", "RFC-2025-001"]);
    }

    #[test]
    fn test_update_completes_step_and_appends_comment() {
        let (mut db, _dir) = setup_test_db();
        let mut record = full_record("RFC-2025-001");
        db.insert(&record).unwrap();

        record.timeline[1].completed = true;
        record.timeline[1].date = NaiveDate::from_ymd_opt(2025, 3, 5);
        record.comments.push(comment("RFC-2025-001-C2", "Done"));
        record.version = 2;
        db.update(&record, 1).unwrap();

        let loaded = db.get("RFC-2025-001").unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_update_stale_version() {
        let (mut db, _dir) = setup_test_db();
        let mut record = rfc("RFC-2025-001");
        db.insert(&record).unwrap();
        record.version = 2;
        db.update(&record, 1).unwrap();

        let err = db.update(&record, 1).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 1, found: 2, .. }));
    }

    #[test]
    fn test_update_missing() {
        let (mut db, _dir) = setup_test_db();
        let err = db.update(&rfc("RFC-2025-404"), 1).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_update_refuses_history_rewrite() {
        let (mut db, _dir) = setup_test_db();
        let record = full_record("RFC-2025-001");
        db.insert(&record).unwrap();

        let mut shorter = record.clone();
        shorter.timeline.pop();
        shorter.version = 2;
        assert!(matches!(
            db.update(&shorter, 1).unwrap_err(),
            StoreError::HistoryRewrite(_)
        ));

        let mut edited = record.clone();
        edited.comments[0].message = "Rewritten".to_string();
        edited.version = 2;
        assert!(matches!(
            db.update(&edited, 1).unwrap_err(),
            StoreError::HistoryRewrite(_)
        ));

        assert_eq!(db.get("RFC-2025-001").unwrap().unwrap(), record);
    }

    #[test]
    fn test_sequences_persist_per_year() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("rfcs.db");
        {
            let mut db = Database::open(&db_path).unwrap();
            assert_eq!(db.next_sequence(2025).unwrap(), 1);
            assert_eq!(db.next_sequence(2025).unwrap(), 2);
        }
        let mut db = Database::open(&db_path).unwrap();
        assert_eq!(db.next_sequence(2025).unwrap(), 3);
        assert_eq!(db.next_sequence(2026).unwrap(), 1);
    }

    #[test]
    fn test_corrupt_status_is_reported() {
        let (mut db, _dir) = setup_test_db();
        db.insert(&rfc("RFC-2025-001")).unwrap();
        db.conn
            .execute("UPDATE rfcs SET status = 'archived' WHERE id = 'RFC-2025-001'", [])
            .unwrap();
        let err = db.get("RFC-2025-001").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    // ==================== Integration Tests ====================

    #[test]
    fn test_engine_lifecycle_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("rfcs.db");
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 8, 10, 0, 0).unwrap());
        let client = Actor::new("Budi", Role::Client);
        let kapokja = Actor::new("Ika", Role::Kapokja);
        let director = Actor::new("Direktur", Role::Director);

        let id = {
            let db = Database::open(&db_path).unwrap();
            let mut engine = Engine::with_clock(db, &clock, Policy::default());
            let rfc = engine
                .submit_rfc(
                    &client,
                    NewRfc {
                        title: "Integrate SSO".to_string(),
                        description: "Single sign-on".to_string(),
                        category: "integrasi".to_string(),
                        reason: "Too many passwords".to_string(),
                        impact_level: Some(Level::Medium),
                        impact_description: "Every employee".to_string(),
                        ..Default::default()
                    },
                )
                .unwrap();
            engine.approve_rfc(&rfc.id, &kapokja, Review::default()).unwrap();
            engine
                .assign_to_pic(
                    &rfc.id,
                    &kapokja,
                    PicAssignment {
                        pic: "Swandi".to_string(),
                        ..Default::default()
                    },
                )
                .unwrap();
            rfc.id
        };

        let db = Database::open(&db_path).unwrap();
        let mut engine = Engine::with_clock(db, &clock, Policy::default());
        let pending = engine.get_rfc(&id).unwrap();
        assert_eq!(pending.status, RfcStatus::Assigned);
        assert!(pending.signature_pending());

        let signed = engine.complete_signature(&id, &director, "secret-42").unwrap();
        assert!(signed.signed);
        assert_eq!(signed.version, 4);
        assert_eq!(engine.get_rfc(&id).unwrap(), signed);
    }

    proptest! {
        #[test]
        fn prop_text_fields_roundtrip(
            title in "[a-zA-Z0-9é ',.-]{1,40}",
            notes in proptest::option::of("[a-zA-Z0-9é ',.-]{0,40}")
        ) {
            let (mut db, _dir) = setup_test_db();
            let mut record = rfc("RFC-2025-001");
            record.title = title;
            record.timeline.push(TimelineStep::planned("Review", None, None, notes));
            db.insert(&record).unwrap();
            prop_assert_eq!(db.get("RFC-2025-001").unwrap().unwrap(), record);
        }
    }
}
