use std::{fmt, io};

use anyhow::{anyhow, Context as _};
use serde::Serialize;
use structopt::StructOpt;

use crate::credential::Credential;
use crate::service::ApiError;
use crate::{Config, Console, OutputFormat, Result};

mod login;
mod logout;
mod table;
mod topics;

pub use login::LoginOpt;
pub use logout::LogoutOpt;
pub use topics::TopicsOpt;

pub trait Outcome: OutcomeSerialize {
    fn is_error(&self) -> bool;
}

pub trait OutcomeSerialize: fmt::Display + fmt::Debug {
    fn write_json(&self, writer: &mut dyn io::Write) -> Result<()>;

    fn write_yaml(&self, writer: &mut dyn io::Write) -> Result<()>;

    fn print(&self, stdout: &mut dyn io::Write, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Default => writeln!(stdout, "{}", self)?,
            OutputFormat::Debug => writeln!(stdout, "{:?}", self)?,
            OutputFormat::Json => {
                self.write_json(stdout)?;
                writeln!(stdout)?;
            }
            OutputFormat::Yaml => self.write_yaml(stdout)?,
        }
        Ok(())
    }
}

impl<T: Serialize + fmt::Display + fmt::Debug> OutcomeSerialize for T {
    fn write_json(&self, writer: &mut dyn io::Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).context("Could not print outcome as json")
    }

    fn write_yaml(&self, writer: &mut dyn io::Write) -> Result<()> {
        serde_yaml::to_writer(writer, self).context("Could not print outcome as yaml")
    }
}

pub trait Run {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>>;
}

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub enum Cmd {
    /// Logs in to AIdea and stores the credential
    #[structopt(visible_alias = "l")]
    Login(LoginOpt),
    /// Removes the stored credential
    Logout(LogoutOpt),
    /// Lists topics and their files, downloads files and submits results
    #[structopt(visible_alias = "t")]
    Topics(TopicsOpt),
}

impl Run for Cmd {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        match self {
            Self::Login(opt) => opt.run(conf, cnsl),
            Self::Logout(opt) => opt.run(conf, cnsl),
            Self::Topics(opt) => opt.run(conf, cnsl),
        }
    }
}

/// A domain failure that has been reported to the user.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Failure {
    message: String,
    causes: Vec<String>,
}

static CAUSES_HEADER: &str = "Error happened. Please check the following reasons.";

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
        }
    }

    pub fn with_causes(message: impl Into<String>, causes: &[&str]) -> Self {
        Self {
            message: message.into(),
            causes: causes.iter().map(|&cause| cause.to_owned()).collect(),
        }
    }

    fn possible_causes(causes: &[&str]) -> Self {
        Self::with_causes(CAUSES_HEADER, causes)
    }

    /// Explains `err` with the causes `action` can fail for.
    ///
    /// A malformed response is not a domain failure and is returned as an error.
    pub fn from_api(err: ApiError, action: Action) -> Result<Self> {
        let failure = match err {
            ApiError::Unauthorized => Self::possible_causes(action.unauthorized_causes()),
            ApiError::SubmissionRejected => Self::possible_causes(&[
                "(Edge AI) Only one concurrent submission is allowed.",
                "You reached upload limits.",
            ]),
            ApiError::NotFound => Self::new("Topic ID error. Please check again."),
            ApiError::Unexpected(code) => Self::new(format!("Status code = {}", code)),
            ApiError::Transport(msg) => {
                Self::with_causes("Could not connect to the server.", &[msg.as_str()])
            }
            ApiError::LocalIo(msg) => {
                Self::with_causes("Could not read your file.", &[msg.as_str()])
            }
            ApiError::Malformed(msg) => {
                return Err(anyhow!("Received malformed response from the server : {}", msg))
            }
        };
        Ok(failure)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)?;
        for cause in &self.causes {
            write!(f, "\n - {}", cause)?;
        }
        Ok(())
    }
}

impl Outcome for Failure {
    fn is_error(&self) -> bool {
        true
    }
}

/// What the user was doing when an api call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ListTopics,
    ListTopicFiles,
    Submit,
}

impl Action {
    fn unauthorized_causes(self) -> &'static [&'static str] {
        match self {
            Self::ListTopics => &["Your login credentials may expire."],
            Self::ListTopicFiles => &[
                "Your login credentials may expire.",
                "You have not registered for the topic yet.",
                "Not in download period now.",
            ],
            Self::Submit => &[
                "Your login credentials may expire.",
                "You have not registered for the topic yet.",
                "Not in upload period now.",
            ],
        }
    }
}

/// Runs `f` with the stored credential, or asks the user to login if there is none.
fn with_credential<F>(conf: &Config, f: F) -> Result<Box<dyn Outcome>>
where
    F: FnOnce(&Credential) -> Result<Box<dyn Outcome>>,
{
    match conf.credential_store().load() {
        Ok(credential) => f(&credential),
        Err(err) => {
            log::debug!("{:#}", anyhow::Error::new(err));
            Ok(Box::new(Failure::new("Please login first.")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsoleConfig;
    use crate::credential::Credential;
    use crate::tests::MockService;

    pub fn login(conf: &Config) -> anyhow::Result<()> {
        conf.credential_store().save(&Credential::new("test-token"))?;
        Ok(())
    }

    /// Runs `opt` on a buffered console, returning the printed outcome and console output.
    pub fn run_with(
        opt: &dyn Run,
        conf: &Config,
        input: &str,
    ) -> anyhow::Result<(Box<dyn Outcome>, String)> {
        let mut cnsl = Console::buf_with_input(ConsoleConfig::default(), input);
        let outcome = opt.run(conf, &mut cnsl)?;
        let output = cnsl.take_output()?;
        eprintln!("{}", output);
        Ok((outcome, output))
    }

    #[test]
    fn failure_from_api() -> anyhow::Result<()> {
        let tests = &[
            (
                ApiError::Unauthorized,
                Action::ListTopics,
                "Error happened. Please check the following reasons.\n - Your login credentials may expire.",
            ),
            (
                ApiError::Unauthorized,
                Action::ListTopicFiles,
                "Error happened. Please check the following reasons.\n - Your login credentials may expire.\n - You have not registered for the topic yet.\n - Not in download period now.",
            ),
            (
                ApiError::Unauthorized,
                Action::Submit,
                "Error happened. Please check the following reasons.\n - Your login credentials may expire.\n - You have not registered for the topic yet.\n - Not in upload period now.",
            ),
            (
                ApiError::SubmissionRejected,
                Action::Submit,
                "Error happened. Please check the following reasons.\n - (Edge AI) Only one concurrent submission is allowed.\n - You reached upload limits.",
            ),
            (
                ApiError::NotFound,
                Action::ListTopicFiles,
                "Topic ID error. Please check again.",
            ),
            (ApiError::Unexpected(502), Action::ListTopics, "Status code = 502"),
            (
                ApiError::Transport("connection refused".into()),
                Action::ListTopics,
                "Could not connect to the server.\n - connection refused",
            ),
        ];
        for (err, action, expected) in tests {
            let failure = Failure::from_api(err.clone(), *action)?;
            assert_eq!(failure.to_string(), *expected);
            assert!(failure.is_error());
        }
        assert!(Failure::from_api(ApiError::Malformed("eof".into()), Action::ListTopics).is_err());
        Ok(())
    }

    #[test]
    fn print_outcome() -> anyhow::Result<()> {
        let failure = Failure::with_causes("message", &["cause"]);
        let tests = &[
            (OutputFormat::Default, "message\n - cause\n"),
            (
                OutputFormat::Json,
                "{\n  \"message\": \"message\",\n  \"causes\": [\n    \"cause\"\n  ]\n}\n",
            ),
        ];
        for (format, expected) in tests {
            let mut stdout = Vec::new();
            failure.print(&mut stdout, *format)?;
            assert_eq!(String::from_utf8(stdout)?, *expected);
        }
        Ok(())
    }

    #[test]
    fn with_credential_requires_login() -> anyhow::Result<()> {
        let service = MockService::start();
        let conf = service.config();

        let outcome = with_credential(&conf, |_| unreachable!())?;
        assert!(outcome.is_error());
        assert_eq!(outcome.to_string(), "Please login first.");

        login(&conf)?;
        let outcome = with_credential(&conf, |credential| {
            assert_eq!(credential.as_str(), "test-token");
            Ok(Box::new(Failure::new("called")))
        })?;
        assert_eq!(outcome.to_string(), "called");
        Ok(())
    }
}
