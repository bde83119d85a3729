//! Shared error types for the services crate.

use thiserror::Error;

use api::ApiError;
use exam_core::model::{OptionId, QuestionKind, ReportError};

use crate::controller::SessionPhase;

/// Errors emitted by `SessionResolver`.
///
/// All three variants are unrecoverable at this layer; callers map them to a
/// navigation decision via `Redirect::for_resolve_error`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("caller is not authenticated")]
    Unauthenticated,

    #[error("no test available for this topic")]
    NoTestAvailable,

    #[error("session creation failed")]
    SessionCreationFailed(#[source] ApiError),
}

/// Errors emitted by `SessionController::start`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StartError {
    #[error("controller already started (phase {0})")]
    AlreadyStarted(SessionPhase),

    #[error("failed to load session state")]
    Load(#[source] ApiError),

    #[error("session state inconsistent: {0}")]
    InconsistentSession(String),
}

/// Errors emitted by `SessionController::submit`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmitError {
    #[error("submit is not valid in phase {0}")]
    InvalidPhase(SessionPhase),

    /// A submission for this question is already in flight.
    #[error("a submission is already in flight")]
    DuplicateSubmission,

    /// The current question already has recorded feedback.
    #[error("question already has recorded feedback")]
    AlreadyAnswered,

    /// Payload shape does not match the question kind. Rejected before any
    /// remote call.
    #[error("payload shape {got} does not match question kind {expected}")]
    InvalidPayload {
        expected: QuestionKind,
        got: QuestionKind,
    },

    /// The grading call failed; the question stays answerable.
    #[error("evaluation failed")]
    Evaluation(#[source] ApiError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Errors emitted by `SessionController::advance`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdvanceError {
    #[error("advance is not valid in phase {0}")]
    InvalidPhase(SessionPhase),
}

/// Errors emitted by `SubmissionEvaluator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvaluateError {
    #[error("payload shape {got} does not match question kind {expected}")]
    InvalidPayload {
        expected: QuestionKind,
        got: QuestionKind,
    },

    #[error(transparent)]
    Remote(#[from] ApiError),
}

/// Errors emitted by question forms.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormError {
    /// No collectable answer yet (e.g. no option selected).
    #[error("no answer collected yet")]
    NotReady,

    /// The form is read-only because feedback was recorded.
    #[error("question is read-only after feedback")]
    Locked,

    #[error("unknown option id: {0}")]
    UnknownOption(OptionId),
}
