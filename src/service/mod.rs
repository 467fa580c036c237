use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod download;
mod request;

use crate::config::Config;
use crate::console::Console;
use crate::credential::Credential;
use crate::model::{SubmissionRequest, Topic, TopicFile, TopicId};
use request::{describe_error, SendPretty as _};

pub use download::{ConsoleProgress, DownloadError, FileDownloader, Progress};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Could not send request : {0}")]
    Transport(String),
    #[error("Received malformed response : {0}")]
    Malformed(String),
}

/// Outcome of an authenticated api call other than success.
///
/// A variant names what a status code means, not which of its causes applies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Request was rejected as unauthorized")]
    Unauthorized,
    #[error("Topic was not found")]
    NotFound,
    #[error("Submission was rejected")]
    SubmissionRejected,
    #[error("Received unexpected status code {0}")]
    Unexpected(u16),
    #[error("Could not send request : {0}")]
    Transport(String),
    #[error("Received malformed response : {0}")]
    Malformed(String),
    #[error("Could not read submission file : {0}")]
    LocalIo(String),
}

impl ApiError {
    fn transport(err: reqwest::Error) -> Self {
        Self::Transport(describe_error(err))
    }
}

/// Status codes an endpoint gives meaning to. Everything else is unexpected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Topics,
    TopicFiles,
    Submission,
}

impl Endpoint {
    fn classify(self, status: StatusCode) -> Result<(), ApiError> {
        match (self, status) {
            (_, StatusCode::OK) => Ok(()),
            (Self::Submission, StatusCode::BAD_REQUEST) => Err(ApiError::SubmissionRejected),
            (_, StatusCode::FORBIDDEN) => Err(ApiError::Unauthorized),
            (Self::TopicFiles, StatusCode::NOT_FOUND) | (Self::Submission, StatusCode::NOT_FOUND) => {
                Err(ApiError::NotFound)
            }
            (_, status) => Err(ApiError::Unexpected(status.as_u16())),
        }
    }
}

#[derive(Serialize, Debug)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize, Debug)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize, Debug)]
struct TopicsResponse {
    topics: Vec<Topic>,
}

#[derive(Deserialize, Debug)]
struct TopicFilesResponse {
    files: Vec<TopicFile>,
}

/// Client of the JSON api. Every call is a single round trip.
#[derive(Debug)]
pub struct ApiClient<'a> {
    client: Client,
    conf: &'a Config,
}

impl<'a> ApiClient<'a> {
    pub fn new(client: Client, conf: &'a Config) -> Self {
        Self { client, conf }
    }

    pub fn login(
        &self,
        username: &str,
        password: &str,
        cnsl: &mut Console,
    ) -> Result<Credential, AuthError> {
        let res = self
            .client
            .post(self.conf.api_url(&["login"]))
            .json(&LoginRequest { username, password })
            .send_pretty(&self.client, cnsl)
            .map_err(|err| AuthError::Transport(describe_error(err)))?;
        if res.status() != StatusCode::OK {
            log::debug!("Login rejected with status {}", res.status());
            return Err(AuthError::InvalidCredentials);
        }
        let body: LoginResponse = read_json(res).map_err(|err| match err {
            ApiError::Transport(msg) => AuthError::Transport(msg),
            ApiError::Malformed(msg) => AuthError::Malformed(msg),
            err => AuthError::Malformed(err.to_string()),
        })?;
        Ok(Credential::new(body.token))
    }

    pub fn list_topics(
        &self,
        credential: &Credential,
        cnsl: &mut Console,
    ) -> Result<Vec<Topic>, ApiError> {
        let res = self
            .client
            .get(self.conf.api_url(&["topics"]))
            .bearer_auth(credential.as_str())
            .send_pretty(&self.client, cnsl)
            .map_err(ApiError::transport)?;
        Endpoint::Topics.classify(res.status())?;
        let body: TopicsResponse = read_json(res)?;
        Ok(body.topics)
    }

    pub fn list_topic_files(
        &self,
        credential: &Credential,
        topic_id: &TopicId,
        cnsl: &mut Console,
    ) -> Result<Vec<TopicFile>, ApiError> {
        let res = self
            .client
            .get(self.conf.api_url(&["topics", "files", topic_id.as_ref()]))
            .bearer_auth(credential.as_str())
            .send_pretty(&self.client, cnsl)
            .map_err(ApiError::transport)?;
        Endpoint::TopicFiles.classify(res.status())?;
        let body: TopicFilesResponse = read_json(res)?;
        Ok(body.files)
    }

    pub fn submit_file(
        &self,
        credential: &Credential,
        request: &SubmissionRequest,
        cnsl: &mut Console,
    ) -> Result<(), ApiError> {
        let form = Form::new()
            .file("submission", request.path().as_ref())
            .map_err(|err| ApiError::LocalIo(format!("{} : {}", request.path(), err)))?;
        let topic_id = request.topic_id().as_ref();
        let res = self
            .client
            .post(self.conf.api_url(&["topics", "submission", topic_id]))
            .bearer_auth(credential.as_str())
            .multipart(form)
            .send_pretty(&self.client, cnsl)
            .map_err(ApiError::transport)?;
        Endpoint::Submission.classify(res.status())
    }
}

/// A body that cannot be read is `Transport`, one that cannot be parsed is `Malformed`.
fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, ApiError> {
    let text = res.text().map_err(ApiError::transport)?;
    serde_json::from_str(&text).map_err(|err| ApiError::Malformed(err.to_string()))
}
