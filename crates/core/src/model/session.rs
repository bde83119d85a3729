use chrono::{DateTime, Utc};
use std::fmt;

use crate::model::answer::AnswerPayload;
use crate::model::feedback::Feedback;
use crate::model::ids::{QuestionId, SessionId, TestId};

/// Lifecycle state of a test session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Completed,
    Abandoned,
}

impl SessionStatus {
    /// Whether a session in this state can still accept submissions.
    #[must_use]
    pub fn is_resumable(self) -> bool {
        matches!(self, SessionStatus::Active)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// The recorded outcome of one accepted submission.
///
/// Returned by the server as part of the session so resumption can replay
/// feedback and seed prior answers without re-grading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredQuestion {
    pub question_id: QuestionId,
    pub payload: AnswerPayload,
    pub feedback: Feedback,
}

/// One user's attempt at a test, as tracked server-side.
///
/// `current_question_index` equals the number of accepted submissions,
/// clamped to the question count; it is non-decreasing while the session is
/// active and frozen once the session completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSession {
    id: SessionId,
    test_id: TestId,
    status: SessionStatus,
    current_question_index: usize,
    started_at: DateTime<Utc>,
    answered: Vec<AnsweredQuestion>,
}

impl TestSession {
    #[must_use]
    pub fn new(
        id: SessionId,
        test_id: TestId,
        status: SessionStatus,
        current_question_index: usize,
        started_at: DateTime<Utc>,
        answered: Vec<AnsweredQuestion>,
    ) -> Self {
        Self {
            id,
            test_id,
            status,
            current_question_index,
            started_at,
            answered,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn answered(&self) -> &[AnsweredQuestion] {
        &self.answered
    }

    /// Recorded outcome for a question, if it was already submitted.
    #[must_use]
    pub fn answer_for(&self, question_id: &QuestionId) -> Option<&AnsweredQuestion> {
        self.answered.iter().find(|a| &a.question_id == question_id)
    }

    #[must_use]
    pub fn is_resumable(&self) -> bool {
        self.status.is_resumable()
    }
}
