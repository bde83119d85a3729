use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{SessionId, TestId};
use crate::model::session::AnsweredQuestion;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReportError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("too many answers for a single session: {len}")]
    TooManyAnswers { len: usize },

    #[error("total answers ({total}) does not match correct + incorrect ({sum})")]
    CountMismatch { total: u32, sum: u32 },
}

/// Session-summary result emitted when a session completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    session_id: SessionId,
    test_id: TestId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total: u32,
    correct: u32,
    incorrect: u32,
}

impl SessionReport {
    /// Rehydrate a report from already-tallied counts.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::CountMismatch` if totals do not align and
    /// `ReportError::InvalidTimeRange` if the completion precedes the start.
    #[allow(clippy::too_many_arguments)]
    pub fn from_counts(
        session_id: SessionId,
        test_id: TestId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        total: u32,
        correct: u32,
        incorrect: u32,
    ) -> Result<Self, ReportError> {
        if completed_at < started_at {
            return Err(ReportError::InvalidTimeRange);
        }
        let sum = correct + incorrect;
        if sum != total {
            return Err(ReportError::CountMismatch { total, sum });
        }

        Ok(Self {
            session_id,
            test_id,
            started_at,
            completed_at,
            total,
            correct,
            incorrect,
        })
    }

    /// Build a report by tallying the session's recorded answers.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidTimeRange` if `completed_at` is before
    /// `started_at` and `ReportError::TooManyAnswers` if the answer count
    /// cannot fit in `u32`.
    pub fn from_answers(
        session_id: SessionId,
        test_id: TestId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        answers: &[AnsweredQuestion],
    ) -> Result<Self, ReportError> {
        let total = u32::try_from(answers.len()).map_err(|_| ReportError::TooManyAnswers {
            len: answers.len(),
        })?;
        let correct = answers
            .iter()
            .filter(|a| a.feedback.is_correct)
            .count() as u32;

        Self::from_counts(
            session_id,
            test_id,
            started_at,
            completed_at,
            total,
            correct,
            total - correct,
        )
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn test_id(&self) -> &TestId {
        &self.test_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerPayload, Feedback, OptionId, QuestionId};
    use crate::time::fixed_now;

    fn answered(id: &str, is_correct: bool) -> AnsweredQuestion {
        AnsweredQuestion {
            question_id: QuestionId::new(id),
            payload: AnswerPayload::Choice {
                option_id: OptionId::new("a"),
            },
            feedback: Feedback {
                is_correct,
                explanation: None,
            },
        }
    }

    #[test]
    fn report_tallies_answers() {
        let now = fixed_now();
        let answers = vec![
            answered("q1", true),
            answered("q2", false),
            answered("q3", true),
        ];

        let report = SessionReport::from_answers(
            SessionId::new("s1"),
            TestId::new("t1"),
            now,
            now + chrono::Duration::minutes(5),
            &answers,
        )
        .unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(report.correct(), 2);
        assert_eq!(report.incorrect(), 1);
    }

    #[test]
    fn completion_before_start_is_rejected() {
        let now = fixed_now();
        let err = SessionReport::from_answers(
            SessionId::new("s1"),
            TestId::new("t1"),
            now,
            now - chrono::Duration::seconds(1),
            &[],
        )
        .unwrap_err();
        assert_eq!(err, ReportError::InvalidTimeRange);
    }

    #[test]
    fn mismatched_counts_are_rejected() {
        let now = fixed_now();
        let err = SessionReport::from_counts(
            SessionId::new("s1"),
            TestId::new("t1"),
            now,
            now,
            3,
            1,
            1,
        )
        .unwrap_err();
        assert_eq!(err, ReportError::CountMismatch { total: 3, sum: 2 });
    }
}
