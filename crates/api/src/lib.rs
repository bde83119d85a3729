#![forbid(unsafe_code)]

pub mod contract;
pub mod error;
pub mod memory;
pub mod rest;

pub use contract::{TestPlatform, TestSummary};
pub use error::ApiError;
pub use memory::{AnswerKey, CallCounts, InMemoryPlatform, ScriptedGrade};
pub use rest::{ApiConfig, ConfigError, RestPlatform};
