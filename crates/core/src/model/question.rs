use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};

//
// ─── QUESTION KINDS ────────────────────────────────────────────────────────────
//

/// The two supported question kinds.
///
/// The kind of a question is fixed at construction and determines which
/// submission payload shape is valid for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    MultipleChoice,
    CodingProblem,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "multiple-choice"),
            QuestionKind::CodingProblem => write!(f, "coding-problem"),
        }
    }
}

//
// ─── OPTIONS ───────────────────────────────────────────────────────────────────
//

/// One selectable answer option of a multiple-choice question.
///
/// Which option is the accepted answer is known only to the grading service;
/// it is never present client-side before submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    id: OptionId,
    text: String,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: OptionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &OptionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

//
// ─── QUESTION BODY ─────────────────────────────────────────────────────────────
//

/// Kind-specific content of a question.
///
/// Adding a further kind means adding one variant here and one arm in the
/// delivery layer's dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionBody {
    MultipleChoice {
        /// Ordered options; order is fixed for the life of the test.
        options: Vec<AnswerOption>,
    },
    CodingProblem {
        /// Starter source text shown on first render.
        code_template: String,
        /// Read-only reference solution, when the author provided one.
        /// Never evaluated client-side.
        reference_solution: Option<String>,
    },
}

impl QuestionBody {
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionBody::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            QuestionBody::CodingProblem { .. } => QuestionKind::CodingProblem,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question title is empty")]
    EmptyTitle,

    #[error("multiple-choice question has no options")]
    NoOptions,

    #[error("duplicate option id: {0}")]
    DuplicateOption(OptionId),
}

/// One question within a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestQuestion {
    id: QuestionId,
    title: String,
    content: String,
    body: QuestionBody,
}

impl TestQuestion {
    /// Builds a question, validating kind-specific invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyTitle` for a blank title,
    /// `QuestionError::NoOptions` for a multiple-choice question without
    /// options, and `QuestionError::DuplicateOption` if two options share
    /// an id.
    pub fn new(
        id: QuestionId,
        title: impl Into<String>,
        content: impl Into<String>,
        body: QuestionBody,
    ) -> Result<Self, QuestionError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuestionError::EmptyTitle);
        }

        if let QuestionBody::MultipleChoice { options } = &body {
            if options.is_empty() {
                return Err(QuestionError::NoOptions);
            }
            let mut seen = HashSet::new();
            for option in options {
                if !seen.insert(option.id().clone()) {
                    return Err(QuestionError::DuplicateOption(option.id().clone()));
                }
            }
        }

        Ok(Self {
            id,
            title,
            content: content.into(),
            body,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Prompt body shown to the user.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn body(&self) -> &QuestionBody {
        &self.body
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.body.kind()
    }

    /// Looks up an option by id. Always `None` for coding problems.
    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&AnswerOption> {
        match &self.body {
            QuestionBody::MultipleChoice { options } => {
                options.iter().find(|option| option.id() == id)
            }
            QuestionBody::CodingProblem { .. } => None,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
