//! Presentation-agnostic input state for the live question.
//!
//! A form is a plain value owned by the embedding view and recreated only
//! when the question index changes (`matches_question` guards that), so
//! in-progress input survives unrelated re-renders of the parent. No
//! formatting or styling assumptions live here.

use exam_core::model::{
    AnswerOption, AnswerPayload, AnsweredQuestion, Feedback, OptionId, QuestionBody, QuestionId,
    QuestionKind, TestQuestion,
};

use crate::error::FormError;

/// Input state for one question, polymorphic over its kind.
///
/// Adding a question kind means adding one variant here and one arm per
/// dispatch below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionForm {
    Choice(ChoiceForm),
    Code(CodeForm),
}

impl QuestionForm {
    /// Builds the form for a question, seeded from the recorded answer when
    /// the question was already submitted in this session.
    #[must_use]
    pub fn for_question(question: &TestQuestion, prior: Option<&AnsweredQuestion>) -> Self {
        match question.body() {
            QuestionBody::MultipleChoice { options } => {
                let mut form = ChoiceForm {
                    question_id: question.id().clone(),
                    options: options.clone(),
                    selected: None,
                    feedback: None,
                };
                if let Some(prior) = prior {
                    if let AnswerPayload::Choice { option_id } = &prior.payload {
                        form.selected = Some(option_id.clone());
                    }
                    form.feedback = Some(prior.feedback.clone());
                }
                QuestionForm::Choice(form)
            }
            QuestionBody::CodingProblem {
                code_template,
                reference_solution,
            } => {
                let mut form = CodeForm {
                    question_id: question.id().clone(),
                    source: code_template.clone(),
                    reference_solution: reference_solution.clone(),
                    feedback: None,
                };
                if let Some(prior) = prior {
                    if let AnswerPayload::Code { source } = &prior.payload {
                        form.source = source.clone();
                    }
                    form.feedback = Some(prior.feedback.clone());
                }
                QuestionForm::Code(form)
            }
        }
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        match self {
            QuestionForm::Choice(form) => &form.question_id,
            QuestionForm::Code(form) => &form.question_id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionForm::Choice(_) => QuestionKind::MultipleChoice,
            QuestionForm::Code(_) => QuestionKind::CodingProblem,
        }
    }

    /// Whether this form belongs to the given question.
    #[must_use]
    pub fn matches_question(&self, question: &TestQuestion) -> bool {
        self.question_id() == question.id() && self.kind() == question.kind()
    }

    /// Collects the raw payload for submission.
    ///
    /// # Errors
    ///
    /// `FormError::NotReady` while no option is selected;
    /// `FormError::Locked` once feedback is recorded.
    pub fn collect_answer(&self) -> Result<AnswerPayload, FormError> {
        match self {
            QuestionForm::Choice(form) => form.collect(),
            QuestionForm::Code(form) => form.collect(),
        }
    }

    /// Records feedback and locks the form. The first recorded feedback
    /// wins; a question is graded once per session.
    pub fn record_feedback(&mut self, feedback: Feedback) {
        let slot = match self {
            QuestionForm::Choice(form) => &mut form.feedback,
            QuestionForm::Code(form) => &mut form.feedback,
        };
        if slot.is_none() {
            *slot = Some(feedback);
        }
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        match self {
            QuestionForm::Choice(form) => form.feedback.as_ref(),
            QuestionForm::Code(form) => form.feedback.as_ref(),
        }
    }

    /// Read-only once feedback is present.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.feedback().is_some()
    }
}

//
// ─── MULTIPLE CHOICE ───────────────────────────────────────────────────────────
//

/// Selection state of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceForm {
    question_id: QuestionId,
    options: Vec<AnswerOption>,
    selected: Option<OptionId>,
    feedback: Option<Feedback>,
}

impl ChoiceForm {
    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    #[must_use]
    pub fn selected(&self) -> Option<&OptionId> {
        self.selected.as_ref()
    }

    /// Select an option. Selection is exclusive; selecting again replaces
    /// the previous choice.
    ///
    /// # Errors
    ///
    /// `FormError::Locked` once feedback is recorded,
    /// `FormError::UnknownOption` for an id not in this question.
    pub fn select(&mut self, option_id: OptionId) -> Result<(), FormError> {
        if self.feedback.is_some() {
            return Err(FormError::Locked);
        }
        if !self.options.iter().any(|option| option.id() == &option_id) {
            return Err(FormError::UnknownOption(option_id));
        }
        self.selected = Some(option_id);
        Ok(())
    }

    fn collect(&self) -> Result<AnswerPayload, FormError> {
        if self.feedback.is_some() {
            return Err(FormError::Locked);
        }
        let option_id = self.selected.clone().ok_or(FormError::NotReady)?;
        Ok(AnswerPayload::Choice { option_id })
    }
}

//
// ─── CODING PROBLEM ────────────────────────────────────────────────────────────
//

/// Editor state of a coding problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeForm {
    question_id: QuestionId,
    source: String,
    reference_solution: Option<String>,
    feedback: Option<Feedback>,
}

impl CodeForm {
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Read-only reference view; never executed client-side.
    #[must_use]
    pub fn reference_solution(&self) -> Option<&str> {
        self.reference_solution.as_deref()
    }

    /// Replace the working source text.
    ///
    /// # Errors
    ///
    /// `FormError::Locked` once feedback is recorded.
    pub fn set_source(&mut self, source: impl Into<String>) -> Result<(), FormError> {
        if self.feedback.is_some() {
            return Err(FormError::Locked);
        }
        self.source = source.into();
        Ok(())
    }

    fn collect(&self) -> Result<AnswerPayload, FormError> {
        if self.feedback.is_some() {
            return Err(FormError::Locked);
        }
        Ok(AnswerPayload::Code {
            source: self.source.clone(),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
