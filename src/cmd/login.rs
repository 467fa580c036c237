use std::fmt;
use std::io::Write as _;

use anyhow::Context as _;
use serde::Serialize;
use structopt::StructOpt;

use crate::cmd::{Failure, Outcome, Run};
use crate::service::{ApiClient, AuthError};
use crate::{Config, Console, Result};

static USERNAME_ENV: &str = "AIDEA_USERNAME";
static PASSWORD_ENV: &str = "AIDEA_PASSWORD";

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct LoginOpt {}

impl Run for LoginOpt {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        writeln!(cnsl, "Please enter the following information.")?;
        let username = cnsl
            .get_env_or_prompt_and_read(USERNAME_ENV, "username or email: ", false)
            .context("Could not read username")?;
        let password = cnsl
            .get_env_or_prompt_and_read(PASSWORD_ENV, "password: ", true)
            .context("Could not read password")?;

        let api = ApiClient::new(conf.build_client()?, conf);
        let credential = match api.login(&username, &password, cnsl) {
            Ok(credential) => credential,
            Err(AuthError::InvalidCredentials) => {
                return Ok(Box::new(Failure::new("Login failed. Please try again.")))
            }
            Err(AuthError::Transport(msg)) => {
                return Ok(Box::new(Failure::with_causes(
                    "Login failed. Please try again.",
                    &[msg.as_str()],
                )))
            }
            Err(err @ AuthError::Malformed(_)) => {
                return Err(err).context("Could not parse login response")
            }
        };

        let store = conf.credential_store();
        if let Err(err) = store.save(&credential) {
            let cause = format!("{} : {}", store.path(), err);
            return Ok(Box::new(Failure::with_causes(
                "Login OK, but could not save the credential.",
                &[cause.as_str()],
            )));
        }
        Ok(Box::new(LoginOutcome { username }))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoginOutcome {
    username: String,
}

impl fmt::Display for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Login OK.")
    }
}

impl Outcome for LoginOutcome {
    fn is_error(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, ResponseTemplate};

    use super::*;
    use crate::cmd::tests::run_with;
    use crate::tests::MockService;

    #[test]
    fn login_stores_token() -> anyhow::Result<()> {
        let service = MockService::start();
        service.mount(
            Mock::given(method("POST"))
                .and(path("/api/v1/login"))
                .and(body_json(json!({"username": "alice", "password": "secret"})))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({"token": "jwt.token"})),
                ),
        );
        let conf = service.config();

        let (outcome, output) = run_with(&LoginOpt {}, &conf, "alice\nsecret\n")?;

        assert!(!outcome.is_error());
        assert_eq!(outcome.to_string(), "Login OK.");
        assert!(output.starts_with("Please enter the following information.\n"));
        assert!(output.contains("username or email: "));
        assert!(output.contains("password: "));
        assert!(!output.contains("secret"));
        assert_eq!(conf.credential_store().load()?.as_str(), "jwt.token");
        Ok(())
    }

    #[test]
    fn login_failed_keeps_previous_token() -> anyhow::Result<()> {
        let service = MockService::start();
        service.mount(
            Mock::given(method("POST"))
                .and(path("/api/v1/login"))
                .respond_with(ResponseTemplate::new(401)),
        );
        let conf = service.config();
        crate::cmd::tests::login(&conf)?;

        let (outcome, _) = run_with(&LoginOpt {}, &conf, "alice\nwrong\n")?;

        assert!(outcome.is_error());
        assert_eq!(outcome.to_string(), "Login failed. Please try again.");
        assert_eq!(conf.credential_store().load()?.as_str(), "test-token");
        Ok(())
    }

    #[test]
    fn login_transport_error() -> anyhow::Result<()> {
        let conf = crate::tests::unreachable_config();
        let (outcome, _) = run_with(&LoginOpt {}, &conf, "alice\nsecret\n")?;
        assert!(outcome.is_error());
        assert!(outcome
            .to_string()
            .starts_with("Login failed. Please try again.\n - "));
        Ok(())
    }

    #[test]
    fn login_malformed_response() -> anyhow::Result<()> {
        let service = MockService::start();
        service.mount(
            Mock::given(method("POST"))
                .and(path("/api/v1/login"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": "x"}))),
        );
        let conf = service.config();
        assert!(run_with(&LoginOpt {}, &conf, "alice\nsecret\n").is_err());
        assert!(conf.credential_store().load().is_err());
        Ok(())
    }

    #[test]
    fn login_without_input() -> anyhow::Result<()> {
        let service = MockService::start();
        let conf = service.config();
        assert!(run_with(&LoginOpt {}, &conf, "").is_err());
        assert!(service.received_requests().is_empty());
        Ok(())
    }
}
