use thiserror::Error;

use crate::model::{QuestionError, ReportError, TestError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Test(#[from] TestError),
    #[error(transparent)]
    Report(#[from] ReportError),
}
