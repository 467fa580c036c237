use std::fmt;

use serde::Serialize;
use structopt::StructOpt;

use crate::cmd::{Outcome, Run};
use crate::{Config, Console, Result};

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct LogoutOpt {}

impl Run for LogoutOpt {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        let removed = conf.credential_store().remove_pretty(cnsl)?;
        Ok(Box::new(LogoutOutcome { removed }))
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogoutOutcome {
    removed: bool,
}

impl fmt::Display for LogoutOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.removed {
            f.write_str("Successfully logged out")
        } else {
            f.write_str("Not logged in")
        }
    }
}

impl Outcome for LogoutOutcome {
    fn is_error(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::tests::{login, run_with};
    use crate::tests::MockService;

    #[test]
    fn run_default() -> anyhow::Result<()> {
        let service = MockService::start();
        let conf = service.config();
        login(&conf)?;

        let (outcome, output) = run_with(&LogoutOpt {}, &conf, "")?;
        assert_eq!(outcome.to_string(), "Successfully logged out");
        assert!(output.ends_with("... removed\n"));
        assert!(conf.credential_store().load().is_err());

        let (outcome, _) = run_with(&LogoutOpt {}, &conf, "")?;
        assert_eq!(outcome.to_string(), "Not logged in");
        Ok(())
    }
}
