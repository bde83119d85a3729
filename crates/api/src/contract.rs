use async_trait::async_trait;

use exam_core::model::{
    AnswerPayload, Feedback, QuestionId, SessionId, Test, TestId, TestSession, TopicId,
};

use crate::error::ApiError;

/// One row of a test listing, without questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSummary {
    pub id: TestId,
    pub topic_id: TopicId,
    pub title: String,
}

/// Contract for the remote test platform.
///
/// The engine consumes the platform exclusively through this trait; the
/// production implementation speaks REST and the in-memory implementation
/// backs tests and prototyping.
#[async_trait]
pub trait TestPlatform: Send + Sync {
    /// List the tests available for a topic, in the platform's own order.
    ///
    /// The returned order is authoritative; callers must not re-sort.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the listing cannot be fetched.
    async fn list_tests(&self, topic: &TopicId) -> Result<Vec<TestSummary>, ApiError>;

    /// Fetch a full test, questions included.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if missing, or other platform errors.
    async fn get_test(&self, id: &TestId) -> Result<Test, ApiError>;

    /// Create a session for a test.
    ///
    /// The platform enforces at-most-one-active-session per (user, test);
    /// this call is not deduplicated client-side.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the session cannot be created.
    async fn create_session(&self, test_id: &TestId) -> Result<TestSession, ApiError>;

    /// Fetch the authoritative state of a session, recorded answers included.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if missing, or other platform errors.
    async fn get_session(&self, id: &SessionId) -> Result<TestSession, ApiError>;

    /// Submit an answer for grading and return the feedback.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Conflict` if the question was already graded in
    /// this session, or other platform errors.
    async fn submit_answer(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
        payload: &AnswerPayload,
    ) -> Result<Feedback, ApiError>;
}
