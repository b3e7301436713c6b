//! Read-side projections: progress, display label, filters, sorting and
//! dashboard counters. Everything here is pure.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::models::{Priority, Rfc, RfcStatus};

/// Submitted, Approved, Assigned, Implementation Planning, Completed.
pub const CANONICAL_MILESTONES: usize = 5;

/// Canonical milestones a record in `status` has not recorded yet. A rejected
/// RFC keeps the milestones it abandoned in its denominator.
pub fn outstanding_milestones(status: RfcStatus) -> usize {
    match status {
        RfcStatus::Draft => 5,
        RfcStatus::Submitted | RfcStatus::ModificationRequested | RfcStatus::Rejected => 4,
        RfcStatus::WaitingAssignment => 3,
        RfcStatus::Assigned => 2,
        RfcStatus::InProgress => 1,
        RfcStatus::Completed => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn of(rfc: &Rfc) -> Self {
        Self {
            completed: rfc.completed_steps(),
            total: rfc.timeline.len() + outstanding_milestones(rfc.status),
        }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    pub fn is_not_started(&self) -> bool {
        self.completed == 0
    }

    /// Compare by percentage without going through floats.
    fn cmp_ratio(&self, other: &Progress) -> Ordering {
        let lhs = self.completed * other.total.max(1);
        let rhs = other.completed * self.total.max(1);
        lhs.cmp(&rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusLabel {
    Rejected,
    ModificationRequested,
    Completed,
    NotStarted,
    NeedsSignature,
    InProgress,
}

impl StatusLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rejected => "Rejected",
            Self::ModificationRequested => "Modification Requested",
            Self::Completed => "Completed",
            Self::NotStarted => "Not Started",
            Self::NeedsSignature => "Needs Signature",
            Self::InProgress => "In Progress",
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display label. The explicit review outcomes win; otherwise the label
/// follows progress, and a pending signature outranks plain "In Progress".
pub fn status_label(rfc: &Rfc) -> StatusLabel {
    match rfc.status {
        RfcStatus::Rejected => return StatusLabel::Rejected,
        RfcStatus::ModificationRequested => return StatusLabel::ModificationRequested,
        _ => {}
    }

    let progress = Progress::of(rfc);
    if progress.is_complete() {
        StatusLabel::Completed
    } else if progress.is_not_started() {
        StatusLabel::NotStarted
    } else if rfc.signature_pending() {
        StatusLabel::NeedsSignature
    } else {
        StatusLabel::InProgress
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
    NotStarted,
    NeedsSignature,
}

impl StatusFilter {
    pub fn matches(&self, rfc: &Rfc) -> bool {
        let progress = Progress::of(rfc);
        match self {
            Self::All => true,
            Self::Pending => progress.completed > 0 && progress.completed < progress.total,
            Self::Completed => progress.completed == progress.total,
            Self::NotStarted => progress.completed == 0,
            Self::NeedsSignature => rfc.signature_pending(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "not_started" => Ok(Self::NotStarted),
            "needs_signature" => Ok(Self::NeedsSignature),
            _ => Err(format!(
                "Invalid status filter '{}'. Must be one of: all, pending, completed, not_started, needs_signature",
                s
            )),
        }
    }
}

/// Substring match on the leading word of the priority label.
pub fn priority_matches(rfc: &Rfc, filter: Option<Priority>) -> bool {
    match filter {
        Some(priority) => rfc.priority.label().contains(priority.keyword()),
        None => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Date,
    Priority,
    Status,
}

impl SortKey {
    /// Stable: records that compare equal keep their incoming order.
    pub fn sort(&self, rfcs: &mut [Rfc]) {
        match self {
            Self::Date => rfcs.sort_by(|a, b| b.last_updated.cmp(&a.last_updated)),
            Self::Priority => rfcs.sort_by(|a, b| b.priority.weight().cmp(&a.priority.weight())),
            Self::Status => {
                rfcs.sort_by(|a, b| Progress::of(b).cmp_ratio(&Progress::of(a)))
            }
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "priority" => Ok(Self::Priority),
            "status" | "progress" => Ok(Self::Status),
            _ => Err(format!(
                "Invalid sort key '{}'. Must be one of: date, priority, status",
                s
            )),
        }
    }
}

pub fn select(
    rfcs: Vec<Rfc>,
    status: StatusFilter,
    priority: Option<Priority>,
    sort: SortKey,
) -> Vec<Rfc> {
    let mut selected: Vec<Rfc> = rfcs
        .into_iter()
        .filter(|rfc| status.matches(rfc) && priority_matches(rfc, priority))
        .collect();
    sort.sort(&mut selected);
    selected
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub in_progress: usize,
    pub pending_tte: usize,
    pub completed: usize,
    pub rejected: usize,
    pub high_priority: usize,
}

impl DashboardStats {
    pub fn collect(rfcs: &[Rfc]) -> Self {
        let mut stats = DashboardStats {
            total: rfcs.len(),
            ..Default::default()
        };

        for rfc in rfcs {
            let progress = Progress::of(rfc);
            if rfc.status == RfcStatus::Rejected {
                stats.rejected += 1;
            } else if progress.is_complete() {
                stats.completed += 1;
            } else if !progress.is_not_started() {
                stats.in_progress += 1;
            }
            if rfc.signature_pending() {
                stats.pending_tte += 1;
            }
            if rfc.priority == Priority::High {
                stats.high_priority += 1;
            }
        }

        stats
    }
}
