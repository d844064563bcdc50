//! Request lifecycle and UI-agnostic session state
//!
//! Everything the front end renders lives in one [`Session`]. Each external
//! occurrence (keystroke outcome, network completion, verification change)
//! is an [`Event`] fed through [`Session::update`], which runs to completion
//! and hands back the [`Effect`]s the front end must carry out.
//!
//! Phases: `Idle -> Submitting -> {Succeeded, Failed}`, and back to
//! `Submitting` on the next accepted submission. Validation happens inside
//! the `Submit` event; a rejected submission leaves the phase untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::blueprint::{Blueprint, Feature, Role};
use crate::extract::ExtractError;
use crate::fields::{FieldKey, FieldValues};
use crate::selection::Selection;
use crate::summary::{summarize, RequirementsSummary};
use crate::verification::VerificationToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Timeout,
    Service,
}

/// The one error message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SubmitError {
    #[error("Please describe the app you want to build.")]
    MissingDescription,

    #[error("Please complete the verification challenge first.")]
    MissingVerification,

    #[error("The service timed out. Try a shorter or clearer description.")]
    Timeout,

    #[error("The service is temporarily unavailable. Please try again later.")]
    Service,
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmitError::MissingDescription | SubmitError::MissingVerification => ErrorKind::Validation,
            SubmitError::Timeout => ErrorKind::Timeout,
            SubmitError::Service => ErrorKind::Service,
        }
    }
}

impl From<&ExtractError> for SubmitError {
    fn from(err: &ExtractError) -> Self {
        match err {
            ExtractError::Timeout => SubmitError::Timeout,
            ExtractError::Status { .. } | ExtractError::Transport(_) | ExtractError::Decode(_) => {
                SubmitError::Service
            }
        }
    }
}

/// What the front end must send to the extraction service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    pub seq: u64,
    pub description: String,
    pub verification: VerificationToken,
}

#[derive(Debug)]
pub enum Event {
    Verified(VerificationToken),
    VerificationExpired,
    Submit { description: String },
    Completed {
        seq: u64,
        result: Result<Blueprint, ExtractError>,
    },
    SelectRole(usize),
    SelectFeature(usize),
    SetField { key: FieldKey, value: String },
    OpenBlueprint,
    CloseBlueprint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Extract(ExtractRequest),
    /// The verification widget must start over; the token is spent
    ResetVerification,
    /// Fresh results are in; bring them into view
    ResultsReady,
    /// Blueprint modal shown; lock background scrolling
    ModalOpened,
    /// Blueprint modal hidden; unlock background scrolling
    ModalClosed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    description: String,
    phase: Phase,
    blueprint: Option<Blueprint>,
    summary: Option<RequirementsSummary>,
    selection: Selection,
    fields: FieldValues,
    error: Option<SubmitError>,
    modal_open: bool,
    /// Sequence number of the latest accepted submission
    seq: u64,
    #[serde(skip)]
    verification: Option<VerificationToken>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase == Phase::Submitting
    }

    pub fn has_verification(&self) -> bool {
        self.verification.is_some()
    }

    /// Whether the submit affordance is enabled
    pub fn can_submit(&self) -> bool {
        !self.is_pending() && self.has_verification()
    }

    pub fn blueprint(&self) -> Option<&Blueprint> {
        self.blueprint.as_ref()
    }

    pub fn summary(&self) -> Option<&RequirementsSummary> {
        self.summary.as_ref()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn error(&self) -> Option<&SubmitError> {
        self.error.as_ref()
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn fields(&self) -> &FieldValues {
        &self.fields
    }

    pub fn field_value(&self, key: &FieldKey) -> &str {
        self.fields.get(key)
    }

    pub fn current_role(&self) -> Option<&Role> {
        self.selection.current_role(self.blueprint.as_ref())
    }

    pub fn current_feature(&self) -> Option<&Feature> {
        self.selection.current_feature(self.blueprint.as_ref())
    }

    /// Keys for every input of the active feature, in field order
    pub fn current_field_keys(&self) -> Vec<FieldKey> {
        match (self.current_role(), self.current_feature()) {
            (Some(role), Some(feature)) => feature
                .input_fields
                .iter()
                .map(|field| FieldKey::for_field(role, feature, field))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn update(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Verified(token) => {
                self.verification = Some(token);
                Vec::new()
            }
            Event::VerificationExpired => {
                self.verification = None;
                Vec::new()
            }
            Event::Submit { description } => self.submit(description),
            Event::Completed { seq, result } => self.complete(seq, result),
            Event::SelectRole(index) => {
                self.selection.select_role(index);
                Vec::new()
            }
            Event::SelectFeature(index) => {
                self.selection.select_feature(index);
                Vec::new()
            }
            Event::SetField { key, value } => {
                self.fields.set(key, value);
                Vec::new()
            }
            Event::OpenBlueprint => {
                if self.modal_open || self.blueprint.is_none() {
                    return Vec::new();
                }
                self.modal_open = true;
                vec![Effect::ModalOpened]
            }
            Event::CloseBlueprint => {
                if !self.modal_open {
                    return Vec::new();
                }
                self.modal_open = false;
                vec![Effect::ModalClosed]
            }
        }
    }

    fn submit(&mut self, description: String) -> Vec<Effect> {
        if self.is_pending() {
            debug!(seq = self.seq, "submission already in flight, ignoring");
            return Vec::new();
        }

        self.description = description;

        if self.description.trim().is_empty() {
            warn!("submission rejected: empty description");
            self.error = Some(SubmitError::MissingDescription);
            return Vec::new();
        }

        let Some(verification) = self.verification.clone() else {
            warn!("submission rejected: no verification token");
            self.error = Some(SubmitError::MissingVerification);
            return Vec::new();
        };

        let mut effects = Vec::new();
        if self.modal_open {
            self.modal_open = false;
            effects.push(Effect::ModalClosed);
        }

        self.blueprint = None;
        self.summary = None;
        self.selection.reset();
        self.fields.clear();
        self.error = None;

        self.seq += 1;
        self.phase = Phase::Submitting;
        info!(seq = self.seq, chars = self.description.chars().count(), "submitting description");

        effects.push(Effect::Extract(ExtractRequest {
            seq: self.seq,
            description: self.description.clone(),
            verification,
        }));
        effects
    }

    fn complete(&mut self, seq: u64, result: Result<Blueprint, ExtractError>) -> Vec<Effect> {
        if !self.is_pending() || seq != self.seq {
            warn!(seq, latest = self.seq, "discarding stale extraction response");
            return Vec::new();
        }

        let mut effects = Vec::new();
        match result {
            Ok(blueprint) => {
                info!(
                    seq,
                    app = %blueprint.app_name,
                    roles = blueprint.roles.len(),
                    features = blueprint.feature_count(),
                    "blueprint received"
                );
                self.summary = Some(summarize(&blueprint));
                self.blueprint = Some(blueprint);
                self.phase = Phase::Succeeded;
                effects.push(Effect::ResultsReady);
            }
            Err(err) => {
                let submit_error = SubmitError::from(&err);
                error!(seq, error = %err, kind = ?submit_error.kind(), "extraction failed");
                self.error = Some(submit_error);
                self.phase = Phase::Failed;
            }
        }

        // Cleanup on leaving Submitting, whatever the outcome
        self.verification = None;
        effects.insert(0, Effect::ResetVerification);
        effects
    }
}
