use std::fmt;

use serde::Serialize;
use structopt::StructOpt;

use crate::cmd::{with_credential, Action, Failure, Outcome, Run};
use crate::model::{SubmissionRequest, TopicId};
use crate::service::ApiClient;
use crate::{Config, Console, Result};

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct SubmitOpt {
    /// Id of the topic
    #[structopt(short, long, visible_alias = "topic_id")]
    topic_id: TopicId,
    /// Result file to submit
    #[structopt(short = "f", long = "file", visible_alias = "file_path")]
    file_path: String,
}

impl Run for SubmitOpt {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        let request =
            match SubmissionRequest::new(self.topic_id.clone(), &self.file_path, conf.base_dir()) {
                Ok(request) => request,
                Err(err) => return Ok(Box::new(Failure::new(err.to_string()))),
            };

        with_credential(conf, |credential| {
            let api = ApiClient::new(conf.build_client()?, conf);
            match api.submit_file(credential, &request, cnsl) {
                Ok(()) => Ok(Box::new(SubmitOutcome {
                    topic_id: self.topic_id.clone(),
                    file_path: self.file_path.clone(),
                })),
                Err(err) => Ok(Box::new(Failure::from_api(err, Action::Submit)?)),
            }
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmitOutcome {
    topic_id: TopicId,
    file_path: String,
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Submit file OK.")
    }
}

impl Outcome for SubmitOutcome {
    fn is_error(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    use super::*;
    use crate::abs_path::AbsPathBuf;
    use crate::cmd::tests::{login, run_with};
    use crate::config::SessionConfig;
    use crate::tests::MockService;

    fn opt(topic_id: &str, file_path: &str) -> SubmitOpt {
        SubmitOpt {
            topic_id: topic_id.into(),
            file_path: file_path.to_owned(),
        }
    }

    #[test]
    fn submit_result() -> anyhow::Result<()> {
        let service = MockService::start();
        service.mount(
            Mock::given(method("POST"))
                .and(path("/api/v1/topics/submission/t1"))
                .and(header("Authorization", "Bearer test-token"))
                .respond_with(ResponseTemplate::new(200)),
        );
        let conf = service.config();
        login(&conf)?;
        fs::write(conf.base_dir().join("result.csv").as_ref(), "id,label\n")?;

        let (outcome, _) = run_with(&opt("t1", "result.csv"), &conf, "")?;

        assert!(!outcome.is_error());
        assert_eq!(outcome.to_string(), "Submit file OK.");
        assert_eq!(service.received_requests().len(), 1);
        Ok(())
    }

    #[test]
    fn missing_file_issues_no_request() -> anyhow::Result<()> {
        let service = MockService::start();
        service.mount(
            Mock::given(method("POST"))
                .and(path("/api/v1/topics/submission/t1"))
                .respond_with(ResponseTemplate::new(200)),
        );
        let conf = service.config();
        login(&conf)?;

        let (outcome, _) = run_with(&opt("t1", "missing.csv"), &conf, "")?;

        assert!(outcome.is_error());
        assert_eq!(
            outcome.to_string(),
            r#"Your file "missing.csv" does not exist. Please check again!"#
        );
        assert!(service.received_requests().is_empty());
        Ok(())
    }

    #[test]
    fn submission_rejected() -> anyhow::Result<()> {
        let tests = &[
            (400u16, "Error happened. Please check the following reasons.\n - (Edge AI) Only one concurrent submission is allowed.\n - You reached upload limits."),
            (403, "Error happened. Please check the following reasons.\n - Your login credentials may expire.\n - You have not registered for the topic yet.\n - Not in upload period now."),
            (404, "Topic ID error. Please check again."),
            (418, "Status code = 418"),
        ];
        let service = MockService::start();
        for (status, _) in tests {
            service.mount(
                Mock::given(method("POST"))
                    .and(path(format!("/api/v1/topics/submission/s{}", status)))
                    .respond_with(ResponseTemplate::new(*status)),
            );
        }
        let conf = service.config();
        login(&conf)?;
        fs::write(conf.base_dir().join("result.csv").as_ref(), "id,label\n")?;

        for (status, expected) in tests {
            let submit_opt = opt(&format!("s{}", status), "result.csv");
            let (outcome, _) = run_with(&submit_opt, &conf, "")?;
            assert!(outcome.is_error());
            assert_eq!(outcome.to_string(), *expected);
        }
        Ok(())
    }

    #[test]
    fn server_unreachable() -> anyhow::Result<()> {
        let test_dir = tempfile::tempdir()?;
        let base_dir = AbsPathBuf::try_new(test_dir.path())?;
        let conf = Config::new(
            url::Url::parse("http://127.0.0.1:1")?,
            base_dir.join(".aidea/config.txt"),
            base_dir,
            SessionConfig::default(),
        )?;
        login(&conf)?;
        fs::write(conf.base_dir().join("result.csv").as_ref(), "id,label\n")?;

        let (outcome, _) = run_with(&opt("t1", "result.csv"), &conf, "")?;

        assert!(outcome.is_error());
        let outcome = outcome.to_string();
        assert!(
            outcome.starts_with("Could not connect to the server.\n - "),
            "{}",
            outcome
        );
        Ok(())
    }
}
