use serde::{Deserialize, Serialize};

use crate::models::{Level, Priority, Role, SprintPlan};

/// Form fields of a new RFC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRfc {
    pub title: String,
    pub description: String,
    pub category: String,
    pub department: String,
    pub application: String,
    pub reason: String,
    pub impact_level: Option<Level>,
    pub impact_description: String,
    pub priority: Priority,
    pub attachments: Vec<String>,
    pub stakeholders: Vec<String>,
}

/// Partial edit of the descriptive fields. `None` leaves a field unchanged;
/// attachments and stakeholders are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfcPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub department: Option<String>,
    pub application: Option<String>,
    pub reason: Option<String>,
    pub impact_level: Option<Level>,
    pub impact_description: Option<String>,
    pub priority: Option<Priority>,
    pub attachments: Vec<String>,
    pub stakeholders: Vec<String>,
}

impl RfcPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.department.is_none()
            && self.application.is_none()
            && self.reason.is_none()
            && self.impact_level.is_none()
            && self.impact_description.is_none()
            && self.priority.is_none()
            && self.attachments.is_empty()
            && self.stakeholders.is_empty()
    }
}

/// Technical assessment recorded with an approval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub technical_complexity: Option<Level>,
    pub risk_level: Option<Level>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicAssignment {
    pub pic: String,
    pub priority: Option<Priority>,
    pub target_timeline: Option<String>,
    pub notes: Option<String>,
}

/// One variant per transition on an existing RFC, carrying exactly the
/// payload that transition needs. Creation goes through
/// [`Engine::submit_rfc`](crate::engine::Engine::submit_rfc) and
/// [`Engine::save_draft`](crate::engine::Engine::save_draft).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    SubmitDraft,
    Update { patch: RfcPatch },
    Approve { review: Review },
    Reject { reason: String },
    RequestModification { reason: String },
    Resubmit { patch: RfcPatch },
    AssignPic { assignment: PicAssignment },
    CreateSprint { plan: SprintPlan },
    CompleteStep { notes: Option<String> },
    CompleteSignature { passkey: String },
    Comment { message: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubmitDraft => "submit",
            Self::Update { .. } => "update",
            Self::Approve { .. } => "approve",
            Self::Reject { .. } => "reject",
            Self::RequestModification { .. } => "request modification of",
            Self::Resubmit { .. } => "resubmit",
            Self::AssignPic { .. } => "assign",
            Self::CreateSprint { .. } => "create a sprint for",
            Self::CompleteStep { .. } => "record progress on",
            Self::CompleteSignature { .. } => "sign",
            Self::Comment { .. } => "comment on",
        }
    }

    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Self::SubmitDraft | Self::Update { .. } | Self::Resubmit { .. } => &[Role::Client],
            Self::Approve { .. }
            | Self::Reject { .. }
            | Self::RequestModification { .. }
            | Self::AssignPic { .. } => &[Role::Kapokja],
            Self::CreateSprint { .. } => &[Role::Pic],
            Self::CompleteStep { .. } => &[Role::Pic, Role::Developer],
            Self::CompleteSignature { .. } => &[Role::Client, Role::Director],
            Self::Comment { .. } => &Role::ALL,
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}
