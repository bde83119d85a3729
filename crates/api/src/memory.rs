use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use exam_core::Clock;
use exam_core::model::{
    AnswerPayload, AnsweredQuestion, Feedback, QuestionId, SessionId, SessionStatus, Test, TestId,
    TestSession, TopicId,
};

use crate::contract::{TestPlatform, TestSummary};
use crate::error::ApiError;

/// How the fake grading service decides correctness for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerKey {
    /// Correct iff the submitted option matches.
    Option(exam_core::model::OptionId),
    /// Correct iff the submitted source contains the needle.
    SourceContains(String),
    /// Every well-shaped submission is correct.
    AcceptAll,
}

impl AnswerKey {
    fn grades_correct(&self, payload: &AnswerPayload) -> bool {
        match (self, payload) {
            (AnswerKey::Option(expected), AnswerPayload::Choice { option_id }) => {
                expected == option_id
            }
            (AnswerKey::SourceContains(needle), AnswerPayload::Code { source }) => {
                source.contains(needle)
            }
            (AnswerKey::AcceptAll, _) => true,
            _ => false,
        }
    }
}

/// Scripted grading outcome for one question of the in-memory platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedGrade {
    pub key: AnswerKey,
    pub correct_note: Option<String>,
    pub incorrect_note: Option<String>,
}

impl ScriptedGrade {
    #[must_use]
    pub fn new(key: AnswerKey) -> Self {
        Self {
            key,
            correct_note: None,
            incorrect_note: None,
        }
    }

    #[must_use]
    pub fn with_notes(
        mut self,
        correct: impl Into<String>,
        incorrect: impl Into<String>,
    ) -> Self {
        self.correct_note = Some(correct.into());
        self.incorrect_note = Some(incorrect.into());
        self
    }
}

/// Per-endpoint call tally, for tests asserting on traffic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub list_tests: usize,
    pub get_test: usize,
    pub create_session: usize,
    pub get_session: usize,
    pub submit_answer: usize,
}

#[derive(Default)]
struct State {
    tests: Vec<Test>,
    grades: HashMap<QuestionId, ScriptedGrade>,
    sessions: HashMap<SessionId, TestSession>,
    calls: CallCounts,
}

/// In-memory platform implementation for testing and prototyping.
///
/// Mirrors the server rules the engine depends on: session ids are minted
/// here, `current_question_index` equals the number of accepted submissions,
/// the session completes when the last question is graded, resubmission of a
/// graded question is refused, and at most one active session exists per
/// test.
pub struct InMemoryPlatform {
    clock: Clock,
    state: Mutex<State>,
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlatform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Clock::default_clock(),
            state: Mutex::new(State::default()),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Registers a test; ungraded questions default to `AcceptAll`.
    #[must_use]
    pub fn with_test(self, test: Test) -> Self {
        {
            let mut state = self.state.lock().expect("platform state poisoned");
            state.tests.push(test);
        }
        self
    }

    #[must_use]
    pub fn with_grade(self, question_id: QuestionId, grade: ScriptedGrade) -> Self {
        {
            let mut state = self.state.lock().expect("platform state poisoned");
            state.grades.insert(question_id, grade);
        }
        self
    }

    /// Snapshot of per-endpoint call counts.
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        self.state.lock().expect("platform state poisoned").calls
    }

    /// Inspection helper for assertions on stored session state.
    #[must_use]
    pub fn session(&self, id: &SessionId) -> Option<TestSession> {
        self.state
            .lock()
            .expect("platform state poisoned")
            .sessions
            .get(id)
            .cloned()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, ApiError> {
        self.state
            .lock()
            .map_err(|e| ApiError::Connection(e.to_string()))
    }
}

#[async_trait]
impl TestPlatform for InMemoryPlatform {
    async fn list_tests(&self, topic: &TopicId) -> Result<Vec<TestSummary>, ApiError> {
        let mut state = self.lock()?;
        state.calls.list_tests += 1;
        Ok(state
            .tests
            .iter()
            .filter(|test| test.topic_id() == topic)
            .map(|test| TestSummary {
                id: test.id().clone(),
                topic_id: test.topic_id().clone(),
                title: test.title().to_owned(),
            })
            .collect())
    }

    async fn get_test(&self, id: &TestId) -> Result<Test, ApiError> {
        let mut state = self.lock()?;
        state.calls.get_test += 1;
        state
            .tests
            .iter()
            .find(|test| test.id() == id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn create_session(&self, test_id: &TestId) -> Result<TestSession, ApiError> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        state.calls.create_session += 1;

        if !state.tests.iter().any(|test| test.id() == test_id) {
            return Err(ApiError::NotFound);
        }

        // At-most-one-active-session per test: hand back the existing one.
        if let Some(existing) = state
            .sessions
            .values()
            .find(|s| s.test_id() == test_id && s.status() == SessionStatus::Active)
        {
            return Ok(existing.clone());
        }

        let session = TestSession::new(
            SessionId::new(Uuid::new_v4().to_string()),
            test_id.clone(),
            SessionStatus::Active,
            0,
            now,
            Vec::new(),
        );
        state
            .sessions
            .insert(session.id().clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: &SessionId) -> Result<TestSession, ApiError> {
        let mut state = self.lock()?;
        state.calls.get_session += 1;
        state.sessions.get(id).cloned().ok_or(ApiError::NotFound)
    }

    async fn submit_answer(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
        payload: &AnswerPayload,
    ) -> Result<Feedback, ApiError> {
        let mut state = self.lock()?;
        state.calls.submit_answer += 1;

        let session = state
            .sessions
            .get(session_id)
            .cloned()
            .ok_or(ApiError::NotFound)?;
        if session.status() != SessionStatus::Active {
            return Err(ApiError::Conflict);
        }
        if session.answer_for(question_id).is_some() {
            return Err(ApiError::Conflict);
        }

        let test = state
            .tests
            .iter()
            .find(|test| test.id() == session.test_id())
            .ok_or(ApiError::NotFound)?;
        let position = test
            .position_of(question_id)
            .ok_or(ApiError::NotFound)?;
        let question = test
            .question_at(position)
            .ok_or(ApiError::NotFound)?;
        if !payload.matches(question.body()) {
            return Err(ApiError::Status(reqwest::StatusCode::BAD_REQUEST));
        }

        let grade = state
            .grades
            .get(question_id)
            .cloned()
            .unwrap_or_else(|| ScriptedGrade::new(AnswerKey::AcceptAll));
        let is_correct = grade.key.grades_correct(payload);
        let feedback = Feedback {
            is_correct,
            explanation: if is_correct {
                grade.correct_note
            } else {
                grade.incorrect_note
            },
        };

        let mut answered = session.answered().to_vec();
        answered.push(AnsweredQuestion {
            question_id: question_id.clone(),
            payload: payload.clone(),
            feedback: feedback.clone(),
        });
        let question_count = test.len();
        let status = if answered.len() >= question_count {
            SessionStatus::Completed
        } else {
            SessionStatus::Active
        };
        let updated = TestSession::new(
            session.id().clone(),
            session.test_id().clone(),
            status,
            answered.len().min(question_count),
            session.started_at(),
            answered,
        );
        state.sessions.insert(updated.id().clone(), updated);

        Ok(feedback)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{AnswerOption, OptionId, QuestionBody, TestQuestion};
    use exam_core::time::fixed_clock;

    fn two_question_test() -> Test {
        let q1 = TestQuestion::new(
            QuestionId::new("q1"),
            "Pick one",
            "Which?",
            QuestionBody::MultipleChoice {
                options: vec![
                    AnswerOption::new(OptionId::new("a"), "A"),
                    AnswerOption::new(OptionId::new("b"), "B"),
                    AnswerOption::new(OptionId::new("c"), "C"),
                ],
            },
        )
        .unwrap();
        let q2 = TestQuestion::new(
            QuestionId::new("q2"),
            "Implement",
            "Write it",
            QuestionBody::CodingProblem {
                code_template: "fn main() {}".into(),
                reference_solution: None,
            },
        )
        .unwrap();
        Test::new(TestId::new("t1"), TopicId::new("7"), "Entrance", vec![q1, q2]).unwrap()
    }

    fn platform() -> InMemoryPlatform {
        InMemoryPlatform::new()
            .with_clock(fixed_clock())
            .with_test(two_question_test())
            .with_grade(
                QuestionId::new("q1"),
                ScriptedGrade::new(AnswerKey::Option(OptionId::new("a")))
                    .with_notes("Correct", "Try again"),
            )
    }

    #[tokio::test]
    async fn create_session_returns_existing_active_session() {
        let platform = platform();
        let first = platform.create_session(&TestId::new("t1")).await.unwrap();
        let second = platform.create_session(&TestId::new("t1")).await.unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(platform.calls().create_session, 2);
    }

    #[tokio::test]
    async fn submit_advances_index_and_completes_on_last_answer() {
        let platform = platform();
        let session = platform.create_session(&TestId::new("t1")).await.unwrap();

        let feedback = platform
            .submit_answer(
                session.id(),
                &QuestionId::new("q1"),
                &AnswerPayload::Choice {
                    option_id: OptionId::new("b"),
                },
            )
            .await
            .unwrap();
        assert!(!feedback.is_correct);
        assert_eq!(feedback.explanation.as_deref(), Some("Try again"));

        let stored = platform.session(session.id()).unwrap();
        assert_eq!(stored.current_question_index(), 1);
        assert_eq!(stored.status(), SessionStatus::Active);

        platform
            .submit_answer(
                session.id(),
                &QuestionId::new("q2"),
                &AnswerPayload::Code {
                    source: "fn main() { }".into(),
                },
            )
            .await
            .unwrap();

        let stored = platform.session(session.id()).unwrap();
        assert_eq!(stored.status(), SessionStatus::Completed);
        assert_eq!(stored.current_question_index(), 2);
    }

    #[tokio::test]
    async fn resubmission_of_graded_question_is_refused() {
        let platform = platform();
        let session = platform.create_session(&TestId::new("t1")).await.unwrap();
        let payload = AnswerPayload::Choice {
            option_id: OptionId::new("a"),
        };

        platform
            .submit_answer(session.id(), &QuestionId::new("q1"), &payload)
            .await
            .unwrap();
        let err = platform
            .submit_answer(session.id(), &QuestionId::new("q1"), &payload)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict));
    }

    #[tokio::test]
    async fn shape_mismatch_is_a_bad_request() {
        let platform = platform();
        let session = platform.create_session(&TestId::new("t1")).await.unwrap();
        let err = platform
            .submit_answer(
                session.id(),
                &QuestionId::new("q1"),
                &AnswerPayload::Code {
                    source: "oops".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(
            matches!(err, ApiError::Status(code) if code == reqwest::StatusCode::BAD_REQUEST)
        );
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_topic() {
        let platform = platform();
        let rows = platform.list_tests(&TopicId::new("7")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, TestId::new("t1"));

        let rows = platform.list_tests(&TopicId::new("8")).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(platform.calls().list_tests, 2);
    }
}
