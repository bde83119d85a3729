use std::env;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use exam_core::model::{
    AnswerOption, AnswerPayload, Feedback, OptionId, QuestionBody, QuestionId, SessionId,
    SessionStatus, Test, TestId, TestQuestion, TestSession, TopicId,
};

use crate::contract::{TestPlatform, TestSummary};
use crate::error::ApiError;

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid base url {raw:?}: {source}")]
    InvalidBaseUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
}

/// Connection settings for the remote test platform.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: Url,
    pub auth_token: Option<String>,
}

impl ApiConfig {
    /// Builds a config from a raw base URL and an optional bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if the URL does not parse.
    pub fn new(base_url: &str, auth_token: Option<String>) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|source| {
            ConfigError::InvalidBaseUrl {
                raw: base_url.to_string(),
                source,
            }
        })?;
        Ok(Self {
            base_url,
            auth_token,
        })
    }

    /// Reads `EXAM_API_URL` and `EXAM_API_TOKEN` from the environment.
    ///
    /// Returns `None` when no usable base URL is configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("EXAM_API_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let auth_token = env::var("EXAM_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        match Self::new(&base_url, auth_token) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("ignoring EXAM_API_URL: {err}");
                None
            }
        }
    }
}

//
// ─── REST PLATFORM ─────────────────────────────────────────────────────────────
//

/// `reqwest`-backed implementation of the platform contract.
#[derive(Clone)]
pub struct RestPlatform {
    client: Client,
    config: ApiConfig,
}

impl RestPlatform {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        tracing::debug!(%status, url = %response.url(), "platform request failed");
        Err(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthenticated,
            StatusCode::NOT_FOUND => ApiError::NotFound,
            StatusCode::CONFLICT => ApiError::Conflict,
            other => ApiError::Status(other),
        })
    }
}

#[async_trait]
impl TestPlatform for RestPlatform {
    async fn list_tests(&self, topic: &TopicId) -> Result<Vec<TestSummary>, ApiError> {
        let request = self
            .client
            .get(self.endpoint("tests"))
            .query(&[("topicId", topic.as_str())]);
        let response = Self::check(self.authorize(request).send().await?).await?;
        let rows: Vec<TestSummaryDto> = response.json().await?;
        Ok(rows.into_iter().map(TestSummaryDto::into_summary).collect())
    }

    async fn get_test(&self, id: &TestId) -> Result<Test, ApiError> {
        let request = self.client.get(self.endpoint(&format!("tests/{id}")));
        let response = Self::check(self.authorize(request).send().await?).await?;
        let dto: TestDto = response.json().await?;
        dto.into_test()
    }

    async fn create_session(&self, test_id: &TestId) -> Result<TestSession, ApiError> {
        let request = self
            .client
            .post(self.endpoint("test-sessions"))
            .json(&CreateSessionRequest {
                test_id: test_id.as_str(),
            });
        let response = Self::check(self.authorize(request).send().await?).await?;
        let dto: SessionDto = response.json().await?;
        dto.into_session()
    }

    async fn get_session(&self, id: &SessionId) -> Result<TestSession, ApiError> {
        let request = self
            .client
            .get(self.endpoint(&format!("test-sessions/{id}")));
        let response = Self::check(self.authorize(request).send().await?).await?;
        let dto: SessionDto = response.json().await?;
        dto.into_session()
    }

    async fn submit_answer(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
        payload: &AnswerPayload,
    ) -> Result<Feedback, ApiError> {
        let request = self
            .client
            .post(self.endpoint(&format!(
                "test-sessions/{session_id}/questions/{question_id}/submit"
            )))
            .json(&SubmitRequest {
                payload: PayloadDto::from_payload(payload),
            });
        let response = Self::check(self.authorize(request).send().await?).await?;
        let dto: FeedbackDto = response.json().await?;
        Ok(dto.into_feedback())
    }
}

//
// ─── WIRE DTOS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestSummaryDto {
    id: String,
    topic_id: String,
    #[serde(default)]
    title: String,
}

impl TestSummaryDto {
    fn into_summary(self) -> TestSummary {
        TestSummary {
            id: TestId::new(self.id),
            topic_id: TopicId::new(self.topic_id),
            title: self.title,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestDto {
    id: String,
    topic_id: String,
    #[serde(default)]
    title: String,
    questions: Vec<QuestionDto>,
}

impl TestDto {
    fn into_test(self) -> Result<Test, ApiError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDto::into_question)
            .collect::<Result<Vec<_>, _>>()?;
        Test::new(
            TestId::new(self.id),
            TopicId::new(self.topic_id),
            self.title,
            questions,
        )
        .map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind")]
enum QuestionDto {
    #[serde(rename = "multiple-choice", rename_all = "camelCase")]
    MultipleChoice {
        id: String,
        title: String,
        #[serde(default)]
        content: String,
        options: Vec<OptionDto>,
    },
    #[serde(rename = "coding-problem", rename_all = "camelCase")]
    CodingProblem {
        id: String,
        title: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        code_template: String,
        #[serde(default)]
        solution: Option<String>,
    },
}

impl QuestionDto {
    fn into_question(self) -> Result<TestQuestion, ApiError> {
        let (id, title, content, body) = match self {
            QuestionDto::MultipleChoice {
                id,
                title,
                content,
                options,
            } => {
                let options = options
                    .into_iter()
                    .map(|o| AnswerOption::new(OptionId::new(o.id), o.text))
                    .collect();
                (
                    id,
                    title,
                    content,
                    QuestionBody::MultipleChoice { options },
                )
            }
            QuestionDto::CodingProblem {
                id,
                title,
                content,
                code_template,
                solution,
            } => (
                id,
                title,
                content,
                QuestionBody::CodingProblem {
                    code_template,
                    reference_solution: solution,
                },
            ),
        };
        TestQuestion::new(QuestionId::new(id), title, content, body)
            .map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct OptionDto {
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionDto {
    id: String,
    test_id: String,
    status: StatusDto,
    current_question_index: usize,
    started_at: DateTime<Utc>,
    #[serde(default)]
    answered: Vec<AnsweredDto>,
}

impl SessionDto {
    fn into_session(self) -> Result<TestSession, ApiError> {
        let answered = self
            .answered
            .into_iter()
            .map(|a| exam_core::model::AnsweredQuestion {
                question_id: QuestionId::new(a.question_id),
                payload: a.payload.into_payload(),
                feedback: a.feedback.into_feedback(),
            })
            .collect();
        Ok(TestSession::new(
            SessionId::new(self.id),
            TestId::new(self.test_id),
            self.status.into_status(),
            self.current_question_index,
            self.started_at,
            answered,
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StatusDto {
    Active,
    Completed,
    Abandoned,
}

impl StatusDto {
    fn into_status(self) -> SessionStatus {
        match self {
            StatusDto::Active => SessionStatus::Active,
            StatusDto::Completed => SessionStatus::Completed,
            StatusDto::Abandoned => SessionStatus::Abandoned,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnsweredDto {
    question_id: String,
    payload: PayloadDto,
    feedback: FeedbackDto,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum PayloadDto {
    #[serde(rename_all = "camelCase")]
    Choice { option_id: String },
    #[serde(rename_all = "camelCase")]
    Code { source: String },
}

impl PayloadDto {
    fn from_payload(payload: &AnswerPayload) -> Self {
        match payload {
            AnswerPayload::Choice { option_id } => PayloadDto::Choice {
                option_id: option_id.as_str().to_owned(),
            },
            AnswerPayload::Code { source } => PayloadDto::Code {
                source: source.clone(),
            },
        }
    }

    fn into_payload(self) -> AnswerPayload {
        match self {
            PayloadDto::Choice { option_id } => AnswerPayload::Choice {
                option_id: OptionId::new(option_id),
            },
            PayloadDto::Code { source } => AnswerPayload::Code { source },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackDto {
    is_correct: bool,
    #[serde(default)]
    feedback: Option<String>,
}

impl FeedbackDto {
    fn into_feedback(self) -> Feedback {
        Feedback {
            is_correct: self.is_correct,
            explanation: self.feedback,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest<'a> {
    test_id: &'a str,
}

#[derive(Debug, Serialize)]
struct SubmitRequest {
    payload: PayloadDto,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::QuestionKind;

    #[test]
    fn config_rejects_invalid_base_url() {
        let err = ApiConfig::new("not a url", None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let platform = RestPlatform::new(ApiConfig::new("http://host/api/", None).unwrap());
        assert_eq!(platform.endpoint("/tests"), "http://host/api/tests");
        assert_eq!(
            platform.endpoint("test-sessions/s1"),
            "http://host/api/test-sessions/s1"
        );
    }

    #[test]
    fn question_dto_decodes_both_kinds() {
        let json = r#"{
            "kind": "multiple-choice",
            "id": "q1",
            "title": "Pick one",
            "content": "Which?",
            "options": [{"id": "a", "text": "A"}, {"id": "b", "text": "B"}]
        }"#;
        let question = serde_json::from_str::<QuestionDto>(json)
            .unwrap()
            .into_question()
            .unwrap();
        assert_eq!(question.kind(), QuestionKind::MultipleChoice);

        let json = r#"{
            "kind": "coding-problem",
            "id": "q2",
            "title": "Implement",
            "content": "Write it",
            "codeTemplate": "fn main() {}",
            "solution": "fn main() { /* ... */ }"
        }"#;
        let question = serde_json::from_str::<QuestionDto>(json)
            .unwrap()
            .into_question()
            .unwrap();
        assert_eq!(question.kind(), QuestionKind::CodingProblem);
    }

    #[test]
    fn question_dto_rejects_empty_options() {
        let json = r#"{
            "kind": "multiple-choice",
            "id": "q1",
            "title": "Pick one",
            "options": []
        }"#;
        let err = serde_json::from_str::<QuestionDto>(json)
            .unwrap()
            .into_question()
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn session_dto_decodes_with_recorded_answers() {
        let json = r#"{
            "id": "s1",
            "testId": "t1",
            "status": "active",
            "currentQuestionIndex": 1,
            "startedAt": "2025-01-01T00:00:00Z",
            "answered": [
                {
                    "questionId": "q1",
                    "payload": {"type": "choice", "optionId": "b"},
                    "feedback": {"isCorrect": false, "feedback": "Try again"}
                }
            ]
        }"#;
        let session = serde_json::from_str::<SessionDto>(json)
            .unwrap()
            .into_session()
            .unwrap();
        assert_eq!(session.current_question_index(), 1);
        assert_eq!(session.status(), SessionStatus::Active);
        let recorded = session.answer_for(&QuestionId::new("q1")).unwrap();
        assert_eq!(recorded.feedback.explanation.as_deref(), Some("Try again"));
    }

    #[test]
    fn session_dto_answered_defaults_to_empty() {
        let json = r#"{
            "id": "s1",
            "testId": "t1",
            "status": "completed",
            "currentQuestionIndex": 2,
            "startedAt": "2025-01-01T00:00:00Z"
        }"#;
        let session = serde_json::from_str::<SessionDto>(json)
            .unwrap()
            .into_session()
            .unwrap();
        assert!(session.answered().is_empty());
        assert_eq!(session.status(), SessionStatus::Completed);
    }

    #[test]
    fn payload_dto_serializes_tagged() {
        let choice = PayloadDto::from_payload(&AnswerPayload::Choice {
            option_id: OptionId::new("b"),
        });
        let json = serde_json::to_string(&choice).unwrap();
        assert_eq!(json, r#"{"type":"choice","optionId":"b"}"#);

        let code = PayloadDto::from_payload(&AnswerPayload::Code {
            source: "x".into(),
        });
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, r#"{"type":"code","source":"x"}"#);
    }
}
