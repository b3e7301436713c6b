//! The RFC lifecycle engine.
//!
//! Every mutation goes through [`Engine::apply`] (or one of the typed
//! wrappers around it). A command is checked for role, source status and
//! payload before anything is written, and the resulting record is stored with
//! an optimistic version check, so a transition is either applied whole or
//! not at all.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::command::{Command, NewRfc, PicAssignment, Review, RfcPatch};
use crate::error::{EngineError, Result, ValidationError};
use crate::models::{
    Actor, Assignment, Comment, CommentKind, Priority, Rfc, RfcStatus, Role, SprintPlan,
    TimelineStep,
};
use crate::signature::{validate_passkey, DEFAULT_MIN_PASSKEY_LEN};
use crate::store::RfcStore;
use crate::view::{self, DashboardStats, SortKey, StatusFilter};

pub const TTE_STEP: &str = "TTE Required";
pub const PLANNING_STEP: &str = "Implementation Planning";
const SIGNATORY: &str = "Direktur";

/// Western Indonesia Time (UTC+7), in minutes.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 7 * 60;

/// Tunables the engine consults while applying transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub id_prefix: String,
    /// Categories whose RFCs need an executive signature once assigned.
    pub signature_categories: Vec<String>,
    pub min_passkey_len: usize,
    /// Offset applied to the clock before taking the calendar date of a
    /// timeline step or the year of a new id.
    pub utc_offset_minutes: i32,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            id_prefix: "RFC".to_string(),
            signature_categories: vec!["integrasi".to_string(), "security".to_string()],
            min_passkey_len: DEFAULT_MIN_PASSKEY_LEN,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

impl Policy {
    pub fn requires_signature(&self, category: &str) -> bool {
        let category = category.trim();
        self.signature_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }

    /// Calendar date of `at` in the desk's local time.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        (at + Duration::minutes(i64::from(self.utc_offset_minutes))).date_naive()
    }
}

enum Outcome {
    Changed(Rfc),
    Unchanged(Rfc),
}

pub struct Engine<S, C = SystemClock> {
    store: S,
    clock: C,
    policy: Policy,
}

impl<S: RfcStore> Engine<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock, Policy::default())
    }
}

impl<S: RfcStore, C: Clock> Engine<S, C> {
    pub fn with_clock(store: S, clock: C, policy: Policy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // Creation

    /// Create an RFC and hand it in for review in one step.
    pub fn submit_rfc(&mut self, actor: &Actor, form: NewRfc) -> Result<Rfc> {
        self.create(actor, form, true)
    }

    pub fn save_draft(&mut self, actor: &Actor, form: NewRfc) -> Result<Rfc> {
        self.create(actor, form, false)
    }

    fn create(&mut self, actor: &Actor, form: NewRfc, submit: bool) -> Result<Rfc> {
        let action = if submit { "submit" } else { "save a draft of" };
        if actor.role != Role::Client {
            warn!(actor = %actor.name, role = %actor.role, action, "creation refused");
            return Err(EngineError::Forbidden {
                role: actor.role,
                action,
            });
        }

        let now = self.clock.now();
        let mut rfc = Rfc {
            id: String::new(),
            title: form.title.trim().to_string(),
            description: form.description,
            category: form.category,
            department: form.department,
            application: form.application,
            reason: form.reason,
            impact_description: form.impact_description,
            requestor: actor.name.clone(),
            priority: form.priority,
            impact_level: form.impact_level,
            technical_complexity: None,
            risk_level: None,
            status: RfcStatus::Draft,
            assignment: None,
            needs_signature: false,
            signed: false,
            sprint: None,
            timeline: Vec::new(),
            comments: Vec::new(),
            attachments: form.attachments,
            stakeholders: form.stakeholders,
            created_at: now,
            last_updated: now,
            version: 1,
        };

        let checked = if submit {
            validate_submission(&rfc)
        } else {
            validate_draft(&rfc)
        };
        if let Err(err) = checked {
            warn!(actor = %actor.name, action, error = %err, "creation refused");
            return Err(err.into());
        }

        let today = self.policy.local_date(now);
        if submit {
            mark_submitted(&mut rfc, today);
        }

        let seq = self.store.next_sequence(today.year())?;
        rfc.id = format!("{}-{}-{:03}", self.policy.id_prefix, today.year(), seq);
        self.store.insert(&rfc)?;

        info!(rfc = %rfc.id, actor = %actor.name, status = %rfc.status, "rfc created");
        Ok(rfc)
    }

    // Transitions

    pub fn apply(&mut self, id: &str, actor: &Actor, command: Command) -> Result<Rfc> {
        let action = command.name();
        let current = self
            .store
            .get(id)?
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        let expected = current.version;
        let from = current.status;

        match self.transition(current, actor, command) {
            Ok(Outcome::Changed(mut next)) => {
                next.version = expected + 1;
                next.last_updated = self.clock.now();
                self.store.update(&next, expected)?;
                info!(
                    rfc = %id,
                    actor = %actor.name,
                    role = %actor.role,
                    action,
                    from = %from,
                    to = %next.status,
                    "transition applied"
                );
                Ok(next)
            }
            Ok(Outcome::Unchanged(rfc)) => {
                debug!(rfc = %id, action, "nothing to apply");
                Ok(rfc)
            }
            Err(err) => {
                warn!(rfc = %id, actor = %actor.name, action, error = %err, "command refused");
                Err(err)
            }
        }
    }

    fn transition(&self, mut rfc: Rfc, actor: &Actor, command: Command) -> Result<Outcome> {
        let action = command.name();
        if !command.permits(actor.role) {
            return Err(EngineError::Forbidden {
                role: actor.role,
                action,
            });
        }

        let now = self.clock.now();
        let today = self.policy.local_date(now);

        match command {
            Command::SubmitDraft => {
                require(&rfc, action, &[RfcStatus::Draft])?;
                validate_submission(&rfc)?;
                mark_submitted(&mut rfc, today);
            }

            Command::Update { patch } => {
                if !rfc.status.is_editable() {
                    return Err(invalid(&rfc, action));
                }
                if patch.is_empty() {
                    return Err(ValidationError::EmptyPatch.into());
                }
                apply_patch(&mut rfc, patch);
                if rfc.status == RfcStatus::Draft {
                    validate_draft(&rfc)?;
                } else {
                    validate_submission(&rfc)?;
                }
            }

            Command::Approve { review } => {
                require(&rfc, action, &[RfcStatus::Submitted])?;
                let Review {
                    technical_complexity,
                    risk_level,
                    notes,
                } = review;
                if technical_complexity.is_some() {
                    rfc.technical_complexity = technical_complexity;
                }
                if risk_level.is_some() {
                    rfc.risk_level = risk_level;
                }
                let notes = non_blank(notes);
                rfc.timeline
                    .push(TimelineStep::done("Approved", &actor.name, today, notes.clone()));
                let message = match &notes {
                    Some(n) => format!("Approved: {}", n),
                    None => "Approved; waiting for PIC assignment".to_string(),
                };
                push_comment(&mut rfc, actor, message, CommentKind::Approval, now);
                rfc.status = RfcStatus::WaitingAssignment;
            }

            Command::Reject { reason } => {
                require(&rfc, action, &[RfcStatus::Submitted])?;
                let reason = required("rejection reason", &reason)?;
                rfc.timeline.push(TimelineStep::done(
                    "Rejected",
                    &actor.name,
                    today,
                    Some(reason.clone()),
                ));
                push_comment(
                    &mut rfc,
                    actor,
                    format!("Rejected: {}", reason),
                    CommentKind::StatusChange,
                    now,
                );
                rfc.status = RfcStatus::Rejected;
            }

            Command::RequestModification { reason } => {
                require(&rfc, action, &[RfcStatus::Submitted])?;
                let reason = required("modification reason", &reason)?;
                rfc.timeline.push(TimelineStep::done(
                    "Modification Requested",
                    &actor.name,
                    today,
                    Some(reason.clone()),
                ));
                push_comment(
                    &mut rfc,
                    actor,
                    format!("Modification requested: {}", reason),
                    CommentKind::StatusChange,
                    now,
                );
                rfc.status = RfcStatus::ModificationRequested;
            }

            Command::Resubmit { patch } => {
                require(&rfc, action, &[RfcStatus::ModificationRequested])?;
                apply_patch(&mut rfc, patch);
                validate_submission(&rfc)?;
                rfc.timeline.push(TimelineStep::done(
                    "Resubmitted",
                    &actor.name,
                    today,
                    Some("Updated after modification request".to_string()),
                ));
                push_comment(
                    &mut rfc,
                    actor,
                    "Resubmitted for review".to_string(),
                    CommentKind::StatusChange,
                    now,
                );
                rfc.status = RfcStatus::Submitted;
            }

            Command::AssignPic { assignment } => {
                require(&rfc, action, &[RfcStatus::WaitingAssignment])?;
                self.assign(&mut rfc, actor, assignment, now)?;
            }

            Command::CreateSprint { plan } => {
                require(&rfc, action, &[RfcStatus::Assigned])?;
                if rfc.signature_pending() {
                    return Err(EngineError::SignatureRequired(rfc.id));
                }
                validate_sprint(&plan)?;
                start_sprint(&mut rfc, actor, plan, now, today);
            }

            Command::CompleteStep { notes } => {
                require(&rfc, action, &[RfcStatus::InProgress])?;
                complete_next_step(&mut rfc, actor, non_blank(notes), now, today)?;
            }

            Command::CompleteSignature { passkey } => {
                if rfc.status == RfcStatus::Rejected {
                    return Err(invalid(&rfc, action));
                }
                if rfc.signed {
                    return Ok(Outcome::Unchanged(rfc));
                }
                if !rfc.needs_signature {
                    return Err(invalid(&rfc, action));
                }
                validate_passkey(&passkey, self.policy.min_passkey_len)?;
                sign(&mut rfc, actor, now, today);
            }

            Command::Comment { message } => {
                let message = required("comment", &message)?;
                push_comment(&mut rfc, actor, message, CommentKind::Comment, now);
            }
        }

        Ok(Outcome::Changed(rfc))
    }

    fn assign(
        &self,
        rfc: &mut Rfc,
        actor: &Actor,
        assignment: PicAssignment,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let pic = assignment.pic.trim();
        if pic.is_empty() {
            return Err(ValidationError::NoPicSelected.into());
        }
        let pic = pic.to_string();
        let notes = non_blank(assignment.notes);
        let target_timeline = non_blank(assignment.target_timeline);
        let today = self.policy.local_date(now);

        if let Some(priority) = assignment.priority {
            rfc.priority = priority;
        }

        let mut step = TimelineStep::done("Assigned to PIC", pic.clone(), today, notes.clone());
        step.estimated_duration = target_timeline.clone();
        rfc.timeline.push(step);

        rfc.assignment = Some(Assignment {
            pic: pic.clone(),
            assigned_by: actor.name.clone(),
            assigned_at: now,
            target_timeline,
            notes,
        });

        if !rfc.signed && self.policy.requires_signature(&rfc.category) {
            rfc.needs_signature = true;
            rfc.timeline.push(TimelineStep::planned(
                TTE_STEP,
                Some(SIGNATORY.to_string()),
                Some("3-5 days".to_string()),
                Some(format!("Awaiting digital signature from {}", SIGNATORY)),
            ));
        }

        push_comment(
            rfc,
            actor,
            format!("Assigned to {}", pic),
            CommentKind::StatusChange,
            now,
        );
        rfc.status = RfcStatus::Assigned;
        Ok(())
    }

    // Typed wrappers

    pub fn submit_draft(&mut self, id: &str, actor: &Actor) -> Result<Rfc> {
        self.apply(id, actor, Command::SubmitDraft)
    }

    pub fn update_rfc(&mut self, id: &str, actor: &Actor, patch: RfcPatch) -> Result<Rfc> {
        self.apply(id, actor, Command::Update { patch })
    }

    pub fn approve_rfc(&mut self, id: &str, actor: &Actor, review: Review) -> Result<Rfc> {
        self.apply(id, actor, Command::Approve { review })
    }

    pub fn reject_rfc(&mut self, id: &str, actor: &Actor, reason: &str) -> Result<Rfc> {
        self.apply(
            id,
            actor,
            Command::Reject {
                reason: reason.to_string(),
            },
        )
    }

    pub fn request_modification(&mut self, id: &str, actor: &Actor, reason: &str) -> Result<Rfc> {
        self.apply(
            id,
            actor,
            Command::RequestModification {
                reason: reason.to_string(),
            },
        )
    }

    pub fn resubmit_rfc(&mut self, id: &str, actor: &Actor, patch: RfcPatch) -> Result<Rfc> {
        self.apply(id, actor, Command::Resubmit { patch })
    }

    pub fn assign_to_pic(
        &mut self,
        id: &str,
        actor: &Actor,
        assignment: PicAssignment,
    ) -> Result<Rfc> {
        self.apply(id, actor, Command::AssignPic { assignment })
    }

    pub fn create_sprint(&mut self, id: &str, actor: &Actor, plan: SprintPlan) -> Result<Rfc> {
        self.apply(id, actor, Command::CreateSprint { plan })
    }

    pub fn complete_step(&mut self, id: &str, actor: &Actor, notes: Option<&str>) -> Result<Rfc> {
        self.apply(
            id,
            actor,
            Command::CompleteStep {
                notes: notes.map(str::to_string),
            },
        )
    }

    pub fn complete_signature(&mut self, id: &str, actor: &Actor, passkey: &str) -> Result<Rfc> {
        self.apply(
            id,
            actor,
            Command::CompleteSignature {
                passkey: passkey.to_string(),
            },
        )
    }

    pub fn add_comment(&mut self, id: &str, actor: &Actor, message: &str) -> Result<Rfc> {
        self.apply(
            id,
            actor,
            Command::Comment {
                message: message.to_string(),
            },
        )
    }

    // Reads

    pub fn get_rfc(&self, id: &str) -> Result<Rfc> {
        self.store
            .get(id)?
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    pub fn list_rfcs(
        &self,
        status: StatusFilter,
        priority: Option<Priority>,
        sort: SortKey,
    ) -> Result<Vec<Rfc>> {
        Ok(view::select(self.store.list()?, status, priority, sort))
    }

    pub fn stats(&self) -> Result<DashboardStats> {
        Ok(DashboardStats::collect(&self.store.list()?))
    }
}

fn invalid(rfc: &Rfc, action: &'static str) -> EngineError {
    EngineError::InvalidTransition {
        id: rfc.id.clone(),
        from: rfc.status,
        action,
    }
}

fn require(rfc: &Rfc, action: &'static str, allowed: &[RfcStatus]) -> Result<()> {
    if allowed.contains(&rfc.status) {
        Ok(())
    } else {
        Err(invalid(rfc, action))
    }
}

fn required(field: &'static str, value: &str) -> std::result::Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_draft(rfc: &Rfc) -> std::result::Result<(), ValidationError> {
    required("title", &rfc.title).map(|_| ())
}

fn validate_submission(rfc: &Rfc) -> std::result::Result<(), ValidationError> {
    required("title", &rfc.title)?;
    required("category", &rfc.category)?;
    required("reason", &rfc.reason)?;
    required("description", &rfc.description)?;
    if rfc.impact_level.is_none() {
        return Err(ValidationError::MissingField("impact level"));
    }
    required("impact description", &rfc.impact_description)?;
    Ok(())
}

fn validate_sprint(plan: &SprintPlan) -> std::result::Result<(), ValidationError> {
    required("sprint name", &plan.name)?;
    required("sprint goal", &plan.goal)?;
    if plan.team.is_empty() {
        return Err(ValidationError::EmptyTeam);
    }
    let mut seen: Vec<String> = Vec::with_capacity(plan.team.len());
    for member in &plan.team {
        let member = required("team member", member)?;
        let key = member.to_lowercase();
        if seen.contains(&key) {
            return Err(ValidationError::DuplicateMember(member));
        }
        seen.push(key);
    }
    if plan.tasks.is_empty() {
        return Err(ValidationError::NoTasks);
    }
    for task in &plan.tasks {
        required("task description", &task.description)?;
        required("task estimate", &task.estimate)?;
    }
    Ok(())
}

fn apply_patch(rfc: &mut Rfc, patch: RfcPatch) {
    let RfcPatch {
        title,
        description,
        category,
        department,
        application,
        reason,
        impact_level,
        impact_description,
        priority,
        attachments,
        stakeholders,
    } = patch;

    if let Some(v) = title {
        rfc.title = v.trim().to_string();
    }
    if let Some(v) = description {
        rfc.description = v;
    }
    if let Some(v) = category {
        rfc.category = v;
    }
    if let Some(v) = department {
        rfc.department = v;
    }
    if let Some(v) = application {
        rfc.application = v;
    }
    if let Some(v) = reason {
        rfc.reason = v;
    }
    if impact_level.is_some() {
        rfc.impact_level = impact_level;
    }
    if let Some(v) = impact_description {
        rfc.impact_description = v;
    }
    if let Some(v) = priority {
        rfc.priority = v;
    }
    rfc.attachments.extend(attachments);
    rfc.stakeholders.extend(stakeholders);
}

fn mark_submitted(rfc: &mut Rfc, today: NaiveDate) {
    rfc.timeline.push(TimelineStep::done(
        "Submitted",
        "System",
        today,
        Some("RFC submitted successfully".to_string()),
    ));
    rfc.status = RfcStatus::Submitted;
}

fn push_comment(
    rfc: &mut Rfc,
    actor: &Actor,
    message: String,
    kind: CommentKind,
    at: DateTime<Utc>,
) {
    let id = format!("{}-C{}", rfc.id, rfc.comments.len() + 1);
    rfc.comments.push(Comment {
        id,
        author: actor.name.clone(),
        message,
        kind,
        created_at: at,
    });
}

fn start_sprint(
    rfc: &mut Rfc,
    actor: &Actor,
    plan: SprintPlan,
    now: DateTime<Utc>,
    today: NaiveDate,
) {
    rfc.timeline.push(TimelineStep::done(
        PLANNING_STEP,
        &actor.name,
        today,
        Some(format!(
            "Sprint \"{}\" created with {} task(s)",
            plan.name.trim(),
            plan.tasks.len()
        )),
    ));
    for task in &plan.tasks {
        let mut step = TimelineStep::planned(
            task.description.trim(),
            non_blank(task.assignee.clone()),
            Some(task.estimate.trim().to_string()),
            None,
        );
        step.notes = Some(format!("Priority: {}", task.priority.keyword()));
        rfc.timeline.push(step);
    }
    push_comment(
        rfc,
        actor,
        format!("Sprint \"{}\" started: {}", plan.name.trim(), plan.goal.trim()),
        CommentKind::StatusChange,
        now,
    );
    rfc.sprint = Some(plan);
    rfc.status = RfcStatus::InProgress;
}

fn complete_next_step(
    rfc: &mut Rfc,
    actor: &Actor,
    notes: Option<String>,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> Result<()> {
    if let Some(idx) = rfc.next_open_step() {
        if rfc.timeline[idx].label == TTE_STEP {
            return Err(EngineError::SignatureRequired(rfc.id.clone()));
        }
        let step = &mut rfc.timeline[idx];
        step.completed = true;
        step.date = Some(today);
        if notes.is_some() {
            step.notes = notes;
        }
        if step.assignee.is_none() {
            step.assignee = Some(actor.name.clone());
        }
    }

    if rfc.next_open_step().is_none() {
        rfc.timeline.push(TimelineStep::done(
            "Completed",
            &actor.name,
            today,
            Some("All implementation steps finished".to_string()),
        ));
        push_comment(
            rfc,
            actor,
            "Implementation completed".to_string(),
            CommentKind::StatusChange,
            now,
        );
        rfc.status = RfcStatus::Completed;
    }
    Ok(())
}

fn sign(rfc: &mut Rfc, actor: &Actor, now: DateTime<Utc>, today: NaiveDate) {
    rfc.signed = true;
    rfc.needs_signature = false;
    if let Some(step) = rfc.timeline.iter_mut().find(|s| s.label == TTE_STEP) {
        step.completed = true;
        step.date = Some(today);
        step.notes = Some(format!("Digitally signed by {}", SIGNATORY));
    }
    push_comment(
        rfc,
        actor,
        format!("Digitally signed by {}", actor.name),
        CommentKind::Approval,
        now,
    );
}

/// Check the record-level invariants. Returns one message per violation.
pub fn invariant_violations(rfc: &Rfc) -> Vec<String> {
    let mut problems = Vec::new();

    if rfc.assignment.is_some() != rfc.status.is_assigned_or_later() {
        problems.push(format!(
            "assigned PIC is {} but status is {}",
            if rfc.assignment.is_some() { "set" } else { "unset" },
            rfc.status
        ));
    }

    let open_tte = rfc
        .timeline
        .iter()
        .any(|s| s.label == TTE_STEP && !s.completed);
    if open_tte != rfc.signature_pending() {
        problems.push(format!(
            "open TTE step ({}) disagrees with signature flags (needs={}, signed={})",
            open_tte, rfc.needs_signature, rfc.signed
        ));
    }

    if let Some(first_open) = rfc.next_open_step() {
        if rfc.timeline[first_open..].iter().any(|s| s.completed) {
            problems.push("a later timeline step is completed before an earlier one".to_string());
        }
    }

    let progress = view::Progress::of(rfc);
    let label = view::status_label(rfc);
    if progress.is_complete() != (label == view::StatusLabel::Completed) {
        problems.push(format!(
            "progress {:.0}% disagrees with label {}",
            progress.percent(),
            label
        ));
    }

    problems
}
