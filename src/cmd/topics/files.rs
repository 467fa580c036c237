use std::fmt;

use serde::Serialize;
use structopt::StructOpt;

use crate::cmd::table::{group_thousands, Align, Table};
use crate::cmd::{with_credential, Action, Failure, Outcome, Run};
use crate::model::{TopicFile, TopicId};
use crate::service::ApiClient;
use crate::{Config, Console, Result};

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct FilesOpt {
    /// Id of the topic
    #[structopt(short, long, visible_alias = "topic_id")]
    topic_id: TopicId,
}

impl Run for FilesOpt {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        with_credential(conf, |credential| {
            let api = ApiClient::new(conf.build_client()?, conf);
            match api.list_topic_files(credential, &self.topic_id, cnsl) {
                Ok(files) => Ok(Box::new(FilesOutcome {
                    topic_id: self.topic_id.clone(),
                    files,
                })),
                Err(err) => Ok(Box::new(Failure::from_api(err, Action::ListTopicFiles)?)),
            }
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilesOutcome {
    topic_id: TopicId,
    files: Vec<TopicFile>,
}

impl fmt::Display for FilesOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut table = Table::new(&[
            ("Filename", Align::Left),
            ("Size", Align::Right),
            ("MD5", Align::Left),
        ]);
        for file in &self.files {
            table.push_row(vec![
                file.filename().to_owned(),
                group_thousands(file.size()),
                file.md5().to_owned(),
            ]);
        }
        write!(f, "{}", table)
    }
}

impl Outcome for FilesOutcome {
    fn is_error(&self) -> bool {
        false
    }
}
