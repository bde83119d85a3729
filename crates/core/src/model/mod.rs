mod answer;
mod connection;
mod feedback;
mod ids;
mod question;
mod report;
mod session;

pub use answer::AnswerPayload;
pub use connection::ConnectionStatus;
pub use feedback::Feedback;
pub use ids::{OptionId, QuestionId, SessionId, TestId, TopicId};
pub use question::{AnswerOption, QuestionBody, QuestionError, QuestionKind, TestQuestion};
pub use report::{ReportError, SessionReport};
pub use session::{AnsweredQuestion, SessionStatus, TestSession};
pub use test::{Test, TestError};
