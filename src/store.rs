use std::collections::HashMap;

use crate::error::StoreError;
use crate::models::Rfc;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence seam for the lifecycle engine.
///
/// Implementations must keep history append-only: an update whose timeline is
/// shorter than the stored one, or whose comments do not start with the stored
/// comments, is refused with [`StoreError::HistoryRewrite`]. Writes are
/// optimistic: `update` only succeeds when the stored version equals
/// `expected_version`.
pub trait RfcStore {
    fn insert(&mut self, rfc: &Rfc) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<Rfc>>;

    fn update(&mut self, rfc: &Rfc, expected_version: u64) -> Result<()>;

    /// All records, newest first.
    fn list(&self) -> Result<Vec<Rfc>>;

    /// Allocate the next per-year sequence number, starting at 1.
    fn next_sequence(&mut self, year: i32) -> Result<u32>;
}

/// HashMap-backed store for tests and fuzzing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, Rfc>,
    order: Vec<String>,
    sequences: HashMap<i32, u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl RfcStore for MemoryStore {
    fn insert(&mut self, rfc: &Rfc) -> Result<()> {
        if self.records.contains_key(&rfc.id) {
            return Err(StoreError::Duplicate(rfc.id.clone()));
        }
        self.order.push(rfc.id.clone());
        self.records.insert(rfc.id.clone(), rfc.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Rfc>> {
        Ok(self.records.get(id).cloned())
    }

    fn update(&mut self, rfc: &Rfc, expected_version: u64) -> Result<()> {
        let stored = self
            .records
            .get_mut(&rfc.id)
            .ok_or_else(|| StoreError::NotFound(rfc.id.clone()))?;

        if stored.version != expected_version {
            return Err(StoreError::Conflict {
                id: rfc.id.clone(),
                expected: expected_version,
                found: stored.version,
            });
        }

        if rfc.timeline.len() < stored.timeline.len()
            || !rfc.comments.starts_with(&stored.comments)
        {
            return Err(StoreError::HistoryRewrite(rfc.id.clone()));
        }

        *stored = rfc.clone();
        Ok(())
    }

    fn list(&self) -> Result<Vec<Rfc>> {
        Ok(self
            .order
            .iter()
            .rev()
            .filter_map(|id| self.records.get(id).cloned())
            .collect())
    }

    fn next_sequence(&mut self, year: i32) -> Result<u32> {
        let seq = self.sequences.entry(year).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::models::{Priority, Rfc, RfcStatus};

    pub fn rfc(id: &str) -> Rfc {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        Rfc {
            id: id.to_string(),
            title: format!("Change {}", id),
            description: "Describe the change".to_string(),
            category: "fitur_baru".to_string(),
            department: "kepegawaian".to_string(),
            application: "simpeg".to_string(),
            reason: "Manual export takes hours".to_string(),
            impact_description: "Monthly reporting".to_string(),
            requestor: "Budi Santoso".to_string(),
            priority: Priority::Medium,
            impact_level: None,
            technical_complexity: None,
            risk_level: None,
            status: RfcStatus::Draft,
            assignment: None,
            needs_signature: false,
            signed: false,
            sprint: None,
            timeline: Vec::new(),
            comments: Vec::new(),
            attachments: Vec::new(),
            stakeholders: Vec::new(),
            created_at: at,
            last_updated: at,
            version: 1,
        }
    }
}
