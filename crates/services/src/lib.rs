#![forbid(unsafe_code)]

pub mod controller;
pub mod delivery;
pub mod error;
pub mod evaluator;
pub mod navigation;
pub mod progress;
pub mod resolver;
pub mod transport;

pub use exam_core::Clock;

pub use controller::{SessionController, SessionPhase, SubmitOutcome};
pub use delivery::{ChoiceForm, CodeForm, QuestionForm};
pub use error::{
    AdvanceError, EvaluateError, FormError, ResolveError, StartError, SubmitError,
};
pub use evaluator::SubmissionEvaluator;
pub use navigation::Redirect;
pub use progress::SessionProgress;
pub use resolver::{AuthProbe, SessionRef, SessionResolver, StaticAuth};
pub use transport::{ConnectionMonitor, StatusWatch};
