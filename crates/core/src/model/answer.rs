use crate::model::ids::OptionId;
use crate::model::question::{QuestionBody, QuestionKind};

/// Raw answer payload for one question, prior to grading.
///
/// The payload shape must match the question's kind; the evaluator rejects
/// mismatches before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerPayload {
    /// Selected option of a multiple-choice question.
    Choice { option_id: OptionId },
    /// Current source text of a coding problem.
    Code { source: String },
}

impl AnswerPayload {
    /// The question kind this payload shape is valid for.
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            AnswerPayload::Choice { .. } => QuestionKind::MultipleChoice,
            AnswerPayload::Code { .. } => QuestionKind::CodingProblem,
        }
    }

    #[must_use]
    pub fn matches_kind(&self, kind: QuestionKind) -> bool {
        self.kind() == kind
    }

    #[must_use]
    pub fn matches(&self, body: &QuestionBody) -> bool {
        self.matches_kind(body.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_kind_matches_question_kind() {
        let choice = AnswerPayload::Choice {
            option_id: OptionId::new("b"),
        };
        assert!(choice.matches_kind(QuestionKind::MultipleChoice));
        assert!(!choice.matches_kind(QuestionKind::CodingProblem));

        let code = AnswerPayload::Code {
            source: "fn main() {}".into(),
        };
        assert!(code.matches_kind(QuestionKind::CodingProblem));
        assert!(!code.matches_kind(QuestionKind::MultipleChoice));
    }
}
