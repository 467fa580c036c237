use structopt::StructOpt;

use crate::cmd::{Outcome, Run};
use crate::{Config, Console, Result};

mod download;
mod files;
mod list;
mod submit;

pub use download::DownloadOpt;
pub use files::FilesOpt;
pub use list::ListOpt;
pub use submit::SubmitOpt;

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct TopicsOpt {
    #[structopt(subcommand)]
    cmd: TopicsCmd,
}

impl Run for TopicsOpt {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        self.cmd.run(conf, cnsl)
    }
}

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub enum TopicsCmd {
    /// Lists all topics
    List(ListOpt),
    /// Lists data files of a topic
    Files(FilesOpt),
    /// Downloads all data files of a topic into the current directory
    Download(DownloadOpt),
    /// Submits a result file to a topic
    Submit(SubmitOpt),
}

impl Run for TopicsCmd {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        match self {
            Self::List(opt) => opt.run(conf, cnsl),
            Self::Files(opt) => opt.run(conf, cnsl),
            Self::Download(opt) => opt.run(conf, cnsl),
            Self::Submit(opt) => opt.run(conf, cnsl),
        }
    }
}
