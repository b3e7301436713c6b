use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of an RFC.
///
/// `Submitted` is the pending-review state: the record has been handed in and
/// waits for a Kapokja decision. Approval is not a resting state; an approved
/// RFC lands directly in `WaitingAssignment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfcStatus {
    Draft,
    Submitted,
    ModificationRequested,
    WaitingAssignment,
    Assigned,
    InProgress,
    Completed,
    Rejected,
}

impl RfcStatus {
    pub const ALL: [RfcStatus; 8] = [
        RfcStatus::Draft,
        RfcStatus::Submitted,
        RfcStatus::ModificationRequested,
        RfcStatus::WaitingAssignment,
        RfcStatus::Assigned,
        RfcStatus::InProgress,
        RfcStatus::Completed,
        RfcStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::ModificationRequested => "modification_requested",
            Self::WaitingAssignment => "waiting_assignment",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::ModificationRequested => "Modification Requested",
            Self::WaitingAssignment => "Waiting Assignment",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Rejected => "Rejected",
        }
    }

    /// Descriptive fields may only change before review has concluded.
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            Self::Draft | Self::Submitted | Self::ModificationRequested
        )
    }

    pub fn is_assigned_or_later(&self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress | Self::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

impl fmt::Display for RfcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RfcStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RfcStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown RFC status '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High - Business Critical",
            Self::Medium => "Medium - Important",
            Self::Low => "Low - Nice to Have",
        }
    }

    /// Leading word of the label; priority filters match on it.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn weight(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    /// Accepts a full label ("Medium - Important") or just its leading word.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match leading_word(s).as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!(
                "Invalid priority '{}'. Must be one of: high, medium, low",
                s
            )),
        }
    }
}

/// Categorical assessment used for impact, technical complexity and risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(label)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match leading_word(s).as_str() {
            "low" | "rendah" => Ok(Self::Low),
            "medium" | "sedang" => Ok(Self::Medium),
            "high" | "tinggi" => Ok(Self::High),
            _ => Err(format!(
                "Invalid level '{}'. Must be one of: low, medium, high",
                s
            )),
        }
    }
}

fn leading_word(s: &str) -> String {
    s.trim()
        .split(|c: char| c.is_whitespace() || c == '-')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Director,
    Pic,
    Kapokja,
    Developer,
    Client,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Director,
        Role::Pic,
        Role::Kapokja,
        Role::Developer,
        Role::Client,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Director => "director",
            Self::Pic => "pic",
            Self::Kapokja => "kapokja",
            Self::Developer => "developer",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Director => "Director",
            Self::Pic => "PIC",
            Self::Kapokja => "Kapokja",
            Self::Developer => "Developer",
            Self::Client => "Client",
        };
        f.write_str(label)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "director" | "direktur" => Ok(Self::Director),
            "pic" => Ok(Self::Pic),
            "kapokja" | "lead" => Ok(Self::Kapokja),
            "developer" | "dev" => Ok(Self::Developer),
            "client" => Ok(Self::Client),
            _ => Err(format!(
                "Invalid role '{}'. Must be one of: director, pic, kapokja, developer, client",
                s
            )),
        }
    }
}

/// Who is performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineStep {
    pub label: String,
    pub assignee: Option<String>,
    pub date: Option<NaiveDate>,
    pub completed: bool,
    pub estimated_duration: Option<String>,
    pub notes: Option<String>,
}

impl TimelineStep {
    pub fn done(
        label: impl Into<String>,
        assignee: impl Into<String>,
        date: NaiveDate,
        notes: Option<String>,
    ) -> Self {
        Self {
            label: label.into(),
            assignee: Some(assignee.into()),
            date: Some(date),
            completed: true,
            estimated_duration: None,
            notes,
        }
    }

    pub fn planned(
        label: impl Into<String>,
        assignee: Option<String>,
        estimated_duration: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            label: label.into(),
            assignee,
            date: None,
            completed: false,
            estimated_duration,
            notes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    Comment,
    StatusChange,
    Approval,
}

impl CommentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::StatusChange => "status_change",
            Self::Approval => "approval",
        }
    }
}

impl FromStr for CommentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comment" => Ok(Self::Comment),
            "status_change" => Ok(Self::StatusChange),
            "approval" => Ok(Self::Approval),
            _ => Err(format!("unknown comment kind '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub message: String,
    pub kind: CommentKind,
    pub created_at: DateTime<Utc>,
}

/// Recorded outcome of the assign-to-PIC transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub pic: String,
    pub assigned_by: String,
    pub assigned_at: DateTime<Utc>,
    pub target_timeline: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintTask {
    pub description: String,
    pub estimate: String,
    pub priority: Priority,
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintPlan {
    pub name: String,
    pub start_date: NaiveDate,
    pub duration: String,
    pub goal: String,
    pub team: Vec<String>,
    pub tasks: Vec<SprintTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rfc {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub department: String,
    pub application: String,
    pub reason: String,
    pub impact_description: String,
    pub requestor: String,
    pub priority: Priority,
    pub impact_level: Option<Level>,
    pub technical_complexity: Option<Level>,
    pub risk_level: Option<Level>,
    pub status: RfcStatus,
    pub assignment: Option<Assignment>,
    pub needs_signature: bool,
    pub signed: bool,
    pub sprint: Option<SprintPlan>,
    pub timeline: Vec<TimelineStep>,
    pub comments: Vec<Comment>,
    pub attachments: Vec<String>,
    pub stakeholders: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub version: u64,
}

impl Rfc {
    pub fn assigned_pic(&self) -> Option<&str> {
        self.assignment.as_ref().map(|a| a.pic.as_str())
    }

    pub fn signature_pending(&self) -> bool {
        self.needs_signature && !self.signed
    }

    pub fn completed_steps(&self) -> usize {
        self.timeline.iter().filter(|step| step.completed).count()
    }

    /// Index of the earliest step that is not completed yet.
    pub fn next_open_step(&self) -> Option<usize> {
        self.timeline.iter().position(|step| !step.completed)
    }
}
