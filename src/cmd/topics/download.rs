use std::fmt;
use std::io::Write as _;

use serde::Serialize;
use structopt::StructOpt;

use crate::cmd::{with_credential, Action, Failure, Outcome, Run};
use crate::console::{sty_g, sty_r, sty_y};
use crate::credential::Credential;
use crate::model::{DownloadTask, TopicFile, TopicId};
use crate::service::{ApiClient, ConsoleProgress, FileDownloader};
use crate::{Config, Console, Result};

#[derive(StructOpt, Debug, Clone, PartialEq, Eq, Hash)]
#[structopt(rename_all = "kebab")]
pub struct DownloadOpt {
    /// Id of the topic
    #[structopt(short, long, visible_alias = "topic_id")]
    topic_id: TopicId,
}

impl Run for DownloadOpt {
    fn run(&self, conf: &Config, cnsl: &mut Console) -> Result<Box<dyn Outcome>> {
        with_credential(conf, |credential| {
            let client = conf.build_client()?;
            let api = ApiClient::new(client.clone(), conf);
            let files = match api.list_topic_files(credential, &self.topic_id, cnsl) {
                Ok(files) => files,
                Err(err) => {
                    return Ok(Box::new(Failure::from_api(err, Action::ListTopicFiles)?))
                }
            };
            let downloader = FileDownloader::new(client, conf.base_dir().clone());
            let outcome = self.download_all(&files, &downloader, credential, conf, cnsl)?;
            Ok(Box::new(outcome))
        })
    }
}

impl DownloadOpt {
    /// Downloads `files` one by one. A failed or skipped file does not stop the others.
    fn download_all(
        &self,
        files: &[TopicFile],
        downloader: &FileDownloader,
        credential: &Credential,
        conf: &Config,
        cnsl: &mut Console,
    ) -> Result<DownloadOutcome> {
        let mut outcome = DownloadOutcome::new(self.topic_id.clone());
        for file in files {
            let task = match DownloadTask::from_topic_file(conf.website_url(), file) {
                Ok(task) => task,
                Err(err) => {
                    cnsl.warn(&err.to_string())?;
                    outcome.failed.push(FailedFile::new(file.filename(), err.to_string()));
                    continue;
                }
            };
            let progress = &mut ConsoleProgress::new(cnsl);
            match downloader.download(&task, credential, cnsl, progress) {
                Ok(size) => {
                    writeln!(cnsl, "{} {}", sty_g("Saved"), task.file_name())?;
                    outcome.downloaded.push(DownloadedFile {
                        file_name: task.file_name().to_owned(),
                        size,
                    });
                }
                Err(err) if err.is_skip() => {
                    writeln!(cnsl, "{}", sty_y(&err))?;
                    outcome.skipped.push(task.file_name().to_owned());
                }
                Err(err) => {
                    writeln!(cnsl, "{}", sty_r(&err))?;
                    outcome
                        .failed
                        .push(FailedFile::new(task.file_name(), err.to_string()));
                }
            }
        }
        Ok(outcome)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadedFile {
    file_name: String,
    size: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct FailedFile {
    file_name: String,
    reason: String,
}

impl FailedFile {
    fn new(file_name: &str, reason: String) -> Self {
        Self {
            file_name: file_name.to_owned(),
            reason,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadOutcome {
    topic_id: TopicId,
    downloaded: Vec<DownloadedFile>,
    skipped: Vec<String>,
    failed: Vec<FailedFile>,
}

impl DownloadOutcome {
    fn new(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            downloaded: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Downloaded {} file(s) of topic {}",
            self.downloaded.len(),
            self.topic_id
        )?;
        if !self.skipped.is_empty() {
            write!(f, ", skipped {}", self.skipped.len())?;
        }
        if !self.failed.is_empty() {
            write!(f, ", failed {}", self.failed.len())?;
            for file in &self.failed {
                write!(f, "\n - {} : {}", file.file_name, file.reason)?;
            }
        }
        Ok(())
    }
}

impl Outcome for DownloadOutcome {
    fn is_error(&self) -> bool {
        !self.failed.is_empty()
    }
}
