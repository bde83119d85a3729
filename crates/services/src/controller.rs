use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use api::TestPlatform;
use exam_core::Clock;
use exam_core::model::{
    AnswerPayload, AnsweredQuestion, Feedback, ReportError, SessionId, SessionReport, Test,
    TestId, TestQuestion,
};

use crate::delivery::QuestionForm;
use crate::error::{AdvanceError, EvaluateError, StartError, SubmitError};
use crate::evaluator::SubmissionEvaluator;
use crate::progress::SessionProgress;
use crate::resolver::SessionRef;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Lifecycle phase of a session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session adopted yet.
    Idle,
    /// Fetching authoritative session and test state.
    Loading,
    /// The current question accepts input.
    AwaitingAnswer,
    /// A submission is in flight; further submits are rejected.
    Submitting,
    /// Feedback for the current question is on display; waiting for advance.
    Reviewing,
    /// Terminal.
    Completed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Loading => write!(f, "loading"),
            SessionPhase::AwaitingAnswer => write!(f, "awaiting-answer"),
            SessionPhase::Submitting => write!(f, "submitting"),
            SessionPhase::Reviewing => write!(f, "reviewing"),
            SessionPhase::Completed => write!(f, "completed"),
        }
    }
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Result of one accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub feedback: Feedback,
    pub is_complete: bool,
    /// Present exactly when the submission completed the session.
    pub report: Option<SessionReport>,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

struct Loaded {
    session_id: SessionId,
    test_id: TestId,
    started_at: DateTime<Utc>,
    test: Test,
    /// Indexed by question position; `Some` once graded.
    answered: Vec<Option<AnsweredQuestion>>,
    current: usize,
}

struct Inner {
    phase: SessionPhase,
    loaded: Option<Loaded>,
    report: Option<SessionReport>,
}

/// Captured under the lock before suspending on the evaluator.
struct SubmitCtx {
    session_id: SessionId,
    test_id: TestId,
    started_at: DateTime<Utc>,
    question: TestQuestion,
    current: usize,
    last_index: usize,
}

/// Drives one test session: owns the current question pointer, the in-flight
/// submission guard and the terminal completion handoff.
///
/// Exactly one controller instance acts on a given session at a time
/// (single-writer invariant); the internal mutex only makes the cooperative
/// interleaving explicit and is never held across an await. The in-flight
/// guard is the `Submitting` phase flag, not the lock.
pub struct SessionController {
    evaluator: SubmissionEvaluator,
    platform: Arc<dyn TestPlatform>,
    clock: Clock,
    inner: Mutex<Inner>,
}

impl SessionController {
    #[must_use]
    pub fn new(platform: Arc<dyn TestPlatform>) -> Self {
        Self {
            evaluator: SubmissionEvaluator::new(Arc::clone(&platform)),
            platform,
            clock: Clock::default_clock(),
            inner: Mutex::new(Inner {
                phase: SessionPhase::Idle,
                loaded: None,
                report: None,
            }),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    //
    // ─── OBSERVERS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.lock().loaded.as_ref().map(|l| l.session_id.clone())
    }

    /// Index of the live question. Zero before a session is adopted.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.lock().loaded.as_ref().map_or(0, |l| l.current)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<TestQuestion> {
        let inner = self.lock();
        let loaded = inner.loaded.as_ref()?;
        loaded.test.question_at(loaded.current).cloned()
    }

    /// Input form for the live question, seeded from any recorded answer.
    #[must_use]
    pub fn current_form(&self) -> Option<QuestionForm> {
        let inner = self.lock();
        let loaded = inner.loaded.as_ref()?;
        let question = loaded.test.question_at(loaded.current)?;
        let prior = loaded.answered.get(loaded.current)?.as_ref();
        Some(QuestionForm::for_question(question, prior))
    }

    /// Recorded feedback for a question index, replayed as-is on resume.
    #[must_use]
    pub fn feedback_for(&self, index: usize) -> Option<Feedback> {
        let inner = self.lock();
        let loaded = inner.loaded.as_ref()?;
        loaded
            .answered
            .get(index)?
            .as_ref()
            .map(|a| a.feedback.clone())
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let inner = self.lock();
        let (total, answered) = inner.loaded.as_ref().map_or((0, 0), |l| {
            (l.test.len(), l.answered.iter().flatten().count())
        });
        SessionProgress {
            total,
            answered,
            remaining: total - answered,
            is_complete: inner.phase == SessionPhase::Completed,
        }
    }

    /// The session-summary result, once the session has completed.
    #[must_use]
    pub fn report(&self) -> Option<SessionReport> {
        self.lock().report.clone()
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Adopt a session reference: fetch the authoritative session and its
    /// test, replay recorded feedback, and land on the resumable question.
    ///
    /// Re-fetching server state here (rather than trusting client memory) is
    /// what reconciles a view abandoned mid-submission: the grading call may
    /// have completed server-side and the recorded answer shows up in the
    /// fetched session.
    ///
    /// # Errors
    ///
    /// `StartError::AlreadyStarted` outside `Idle`; `StartError::Load` for
    /// fetch failures (the controller returns to `Idle` and may be started
    /// again); `StartError::InconsistentSession` when the session references
    /// questions or indices the test does not have.
    pub async fn start(&self, session_ref: &SessionRef) -> Result<(), StartError> {
        {
            let mut inner = self.lock();
            if inner.phase != SessionPhase::Idle {
                return Err(StartError::AlreadyStarted(inner.phase));
            }
            inner.phase = SessionPhase::Loading;
        }

        let fetched = self.fetch_state(session_ref).await;

        let mut inner = self.lock();
        let (session, test) = match fetched {
            Ok(pair) => pair,
            Err(err) => {
                inner.phase = SessionPhase::Idle;
                return Err(StartError::Load(err));
            }
        };

        let question_count = test.len();
        let index = session.current_question_index();
        if index > question_count {
            inner.phase = SessionPhase::Idle;
            return Err(StartError::InconsistentSession(format!(
                "index {index} exceeds question count {question_count}"
            )));
        }

        let mut answered: Vec<Option<AnsweredQuestion>> = vec![None; question_count];
        for recorded in session.answered() {
            let Some(position) = test.position_of(&recorded.question_id) else {
                inner.phase = SessionPhase::Idle;
                return Err(StartError::InconsistentSession(format!(
                    "recorded answer for unknown question {}",
                    recorded.question_id
                )));
            };
            answered[position] = Some(recorded.clone());
        }

        let phase = if !session.is_resumable() || index == question_count {
            SessionPhase::Completed
        } else if answered[index].is_some() {
            SessionPhase::Reviewing
        } else {
            SessionPhase::AwaitingAnswer
        };
        tracing::debug!(
            session = %session.id(),
            index,
            %phase,
            replayed = session.answered().len(),
            "session adopted"
        );

        let loaded = Loaded {
            session_id: session.id().clone(),
            test_id: session.test_id().clone(),
            started_at: session.started_at(),
            test,
            answered,
            current: index.min(question_count.saturating_sub(1)),
        };
        if phase == SessionPhase::Completed {
            inner.report = build_report(&loaded, self.clock.now()).ok();
        }
        inner.loaded = Some(loaded);
        inner.phase = phase;
        Ok(())
    }

    async fn fetch_state(
        &self,
        session_ref: &SessionRef,
    ) -> Result<(exam_core::model::TestSession, Test), api::ApiError> {
        let session = self.platform.get_session(&session_ref.session_id).await?;
        let test = self.platform.get_test(session.test_id()).await?;
        Ok((session, test))
    }

    /// Submit an answer for the live question.
    ///
    /// Valid only in `AwaitingAnswer`. While a submission is in flight a
    /// second call fails with `DuplicateSubmission` and issues no remote
    /// call. On evaluator failure the phase returns to `AwaitingAnswer` and
    /// the submission may be retried. On success the feedback is recorded
    /// (the question becomes permanently read-only) and the controller
    /// either pauses in `Reviewing` at the same index or, after the final
    /// question, completes and emits the session report.
    ///
    /// # Errors
    ///
    /// See `SubmitError`; only `SubmitError::Evaluation` is retryable.
    pub async fn submit(&self, payload: AnswerPayload) -> Result<SubmitOutcome, SubmitError> {
        let ctx = {
            let mut inner = self.lock();
            match inner.phase {
                SessionPhase::AwaitingAnswer => {}
                SessionPhase::Submitting => {
                    tracing::warn!("rejecting submit while a submission is in flight");
                    return Err(SubmitError::DuplicateSubmission);
                }
                phase => return Err(SubmitError::InvalidPhase(phase)),
            }
            let Some(loaded) = inner.loaded.as_ref() else {
                return Err(SubmitError::InvalidPhase(inner.phase));
            };
            if loaded.answered[loaded.current].is_some() {
                return Err(SubmitError::AlreadyAnswered);
            }
            let Some(question) = loaded.test.question_at(loaded.current) else {
                return Err(SubmitError::InvalidPhase(inner.phase));
            };
            let ctx = SubmitCtx {
                session_id: loaded.session_id.clone(),
                test_id: loaded.test_id.clone(),
                started_at: loaded.started_at,
                question: question.clone(),
                current: loaded.current,
                last_index: loaded.test.last_index(),
            };
            inner.phase = SessionPhase::Submitting;
            ctx
        };

        // The only suspension point; the lock is not held here.
        let evaluated = self
            .evaluator
            .evaluate(&ctx.session_id, &ctx.question, &payload)
            .await;

        let mut inner = self.lock();
        let feedback = match evaluated {
            Ok(feedback) => feedback,
            Err(err) => {
                inner.phase = SessionPhase::AwaitingAnswer;
                return Err(match err {
                    EvaluateError::InvalidPayload { expected, got } => {
                        SubmitError::InvalidPayload { expected, got }
                    }
                    EvaluateError::Remote(source) => SubmitError::Evaluation(source),
                });
            }
        };

        if let Some(loaded) = inner.loaded.as_mut() {
            loaded.answered[ctx.current] = Some(AnsweredQuestion {
                question_id: ctx.question.id().clone(),
                payload,
                feedback: feedback.clone(),
            });
        }

        if ctx.current == ctx.last_index {
            inner.phase = SessionPhase::Completed;
            let recorded = inner
                .loaded
                .as_ref()
                .map(|l| l.answered.iter().flatten().cloned().collect::<Vec<_>>())
                .unwrap_or_default();
            let report = SessionReport::from_answers(
                ctx.session_id,
                ctx.test_id,
                ctx.started_at,
                self.clock.now().max(ctx.started_at),
                &recorded,
            )?;
            inner.report = Some(report.clone());
            tracing::debug!(total = report.total(), correct = report.correct(), "session completed");
            Ok(SubmitOutcome {
                feedback,
                is_complete: true,
                report: Some(report),
            })
        } else {
            inner.phase = SessionPhase::Reviewing;
            Ok(SubmitOutcome {
                feedback,
                is_complete: false,
                report: None,
            })
        }
    }

    /// Move past a reviewed question to the next one.
    ///
    /// # Errors
    ///
    /// `AdvanceError::InvalidPhase` outside `Reviewing`.
    pub fn advance(&self) -> Result<usize, AdvanceError> {
        let mut inner = self.lock();
        if inner.phase != SessionPhase::Reviewing {
            return Err(AdvanceError::InvalidPhase(inner.phase));
        }
        let Some(loaded) = inner.loaded.as_mut() else {
            return Err(AdvanceError::InvalidPhase(inner.phase));
        };

        loaded.current += 1;
        let next_answered = loaded
            .answered
            .get(loaded.current)
            .is_some_and(Option::is_some);
        let next_phase = if next_answered {
            // Tolerated resume shape: the next question was already graded.
            SessionPhase::Reviewing
        } else {
            SessionPhase::AwaitingAnswer
        };
        let current = loaded.current;
        inner.phase = next_phase;
        Ok(current)
    }
}

fn build_report(loaded: &Loaded, now: DateTime<Utc>) -> Result<SessionReport, ReportError> {
    let recorded: Vec<AnsweredQuestion> = loaded.answered.iter().flatten().cloned().collect();
    SessionReport::from_answers(
        loaded.session_id.clone(),
        loaded.test_id.clone(),
        loaded.started_at,
        now.max(loaded.started_at),
        &recorded,
    )
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
