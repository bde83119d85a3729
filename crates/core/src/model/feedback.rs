/// Graded outcome of one submitted answer.
///
/// Produced at most once per question per session; once recorded, the
/// question is read-only for the remainder of that session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub is_correct: bool,
    pub explanation: Option<String>,
}

impl Feedback {
    #[must_use]
    pub fn correct() -> Self {
        Self {
            is_correct: true,
            explanation: None,
        }
    }

    #[must_use]
    pub fn incorrect(explanation: impl Into<String>) -> Self {
        Self {
            is_correct: false,
            explanation: Some(explanation.into()),
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}
