#![warn(clippy::all)]

#[macro_use]
extern crate strum;

use std::io::Write;
use std::time::Duration;

use anyhow::Context as _;
use serde::Serialize;
use structopt::StructOpt;
use strum::VariantNames;
use url::Url;

mod cmd;
mod config;
mod credential;
mod model;
mod service;

pub use aidea_util::{abs_path, console};

use cmd::{Cmd, Run as _};
use config::Config;
use console::{Console, ConsoleConfig};

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct Opt {
    #[structopt(flatten)]
    global_opt: GlobalOpt,
    #[structopt(subcommand)]
    cmd: Cmd,
}

impl Opt {
    pub fn console_config(&self) -> ConsoleConfig {
        ConsoleConfig {
            assume_yes: self.global_opt.assume_yes,
        }
    }

    pub fn run(&self, stdout: &mut dyn Write, cnsl: &mut Console) -> Result<()> {
        let conf = Config::load(&self.global_opt).context("Could not load config")?;
        log::debug!("{:?}", conf);

        let outcome = self.cmd.run(&conf, cnsl)?;
        cnsl.flush()?;
        outcome.print(stdout, self.global_opt.output)?;
        if outcome.is_error() {
            log::debug!("Command finished with a handled failure");
        }
        Ok(())
    }
}

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct GlobalOpt {
    /// Website of the contest platform
    #[structopt(
        long,
        global = true,
        env = "AIDEA_WEBSITE_URL",
        default_value = config::DEFAULT_WEBSITE_URL
    )]
    website_url: Url,
    /// Timeout of each request (e.g. 30s, 2m). Requests never time out if not given
    #[structopt(long, global = true, parse(try_from_str = humantime::parse_duration))]
    timeout: Option<Duration>,
    /// Assumes "yes" as answer to all prompts
    #[structopt(name = "yes", short = "y", long = "yes", global = true)]
    assume_yes: bool,
    /// Format of the output
    #[structopt(
        short,
        long,
        global = true,
        default_value = OutputFormat::Default.into(),
        possible_values = &OutputFormat::VARIANTS
    )]
    output: OutputFormat,
}

#[derive(
    Serialize,
    EnumString,
    EnumVariantNames,
    IntoStaticStr,
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    Default,
    Debug,
    Json,
    Yaml,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Default
    }
}
