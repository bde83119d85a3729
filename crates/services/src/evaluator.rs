use std::sync::Arc;

use api::TestPlatform;
use exam_core::model::{AnswerPayload, Feedback, SessionId, TestQuestion};

use crate::error::EvaluateError;

/// Forwards one raw answer to the remote grading contract.
///
/// Stateless: safe to retry after a remote failure as long as no feedback has
/// been recorded for the question (the controller's read-only rule enforces
/// that, not this component). Performs no grading of its own; the
/// coding-problem reference solution is a display concern and is never
/// executed here.
#[derive(Clone)]
pub struct SubmissionEvaluator {
    platform: Arc<dyn TestPlatform>,
}

impl SubmissionEvaluator {
    #[must_use]
    pub fn new(platform: Arc<dyn TestPlatform>) -> Self {
        Self { platform }
    }

    /// Validate the payload shape and delegate grading to the platform.
    ///
    /// # Errors
    ///
    /// Returns `EvaluateError::InvalidPayload` synchronously, before any
    /// remote call, when the payload shape does not match the question kind;
    /// `EvaluateError::Remote` when grading fails.
    pub async fn evaluate(
        &self,
        session_id: &SessionId,
        question: &TestQuestion,
        payload: &AnswerPayload,
    ) -> Result<Feedback, EvaluateError> {
        if !payload.matches_kind(question.kind()) {
            return Err(EvaluateError::InvalidPayload {
                expected: question.kind(),
                got: payload.kind(),
            });
        }

        let feedback = self
            .platform
            .submit_answer(session_id, question.id(), payload)
            .await?;
        tracing::debug!(
            question = %question.id(),
            is_correct = feedback.is_correct,
            "submission graded"
        );
        Ok(feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{AnswerKey, InMemoryPlatform, ScriptedGrade, TestPlatform};
    use exam_core::model::{
        AnswerOption, OptionId, QuestionBody, QuestionId, Test, TestId, TopicId,
    };

    fn choice_question() -> TestQuestion {
        TestQuestion::new(
            QuestionId::new("q1"),
            "Pick one",
            "Which?",
            QuestionBody::MultipleChoice {
                options: vec![
                    AnswerOption::new(OptionId::new("a"), "A"),
                    AnswerOption::new(OptionId::new("b"), "B"),
                ],
            },
        )
        .unwrap()
    }

    fn platform_with(question: TestQuestion) -> Arc<InMemoryPlatform> {
        let test = Test::new(
            TestId::new("t1"),
            TopicId::new("7"),
            "Entrance",
            vec![question],
        )
        .unwrap();
        Arc::new(
            InMemoryPlatform::new().with_test(test).with_grade(
                QuestionId::new("q1"),
                ScriptedGrade::new(AnswerKey::Option(OptionId::new("a"))),
            ),
        )
    }

    #[tokio::test]
    async fn shape_mismatch_fails_without_remote_call() {
        let platform = platform_with(choice_question());
        let shared: Arc<dyn TestPlatform> = platform.clone();
        let evaluator = SubmissionEvaluator::new(shared);
        let session = platform.create_session(&TestId::new("t1")).await.unwrap();

        let err = evaluator
            .evaluate(
                session.id(),
                &choice_question(),
                &AnswerPayload::Code {
                    source: "oops".into(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EvaluateError::InvalidPayload { .. }));
        assert_eq!(platform.calls().submit_answer, 0);
    }

    #[tokio::test]
    async fn well_shaped_payload_is_graded_remotely() {
        let platform = platform_with(choice_question());
        let shared: Arc<dyn TestPlatform> = platform.clone();
        let evaluator = SubmissionEvaluator::new(shared);
        let session = platform.create_session(&TestId::new("t1")).await.unwrap();

        let feedback = evaluator
            .evaluate(
                session.id(),
                &choice_question(),
                &AnswerPayload::Choice {
                    option_id: OptionId::new("a"),
                },
            )
            .await
            .unwrap();

        assert!(feedback.is_correct);
        assert_eq!(platform.calls().submit_answer, 1);
    }
}
