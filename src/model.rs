use std::convert::Infallible;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use getset::{CopyGetters, Getters};
use serde::{de, Deserialize, Deserializer, Serialize};
use url::Url;

use crate::abs_path::AbsPathBuf;

static LINK_DELIMITER: &str = "___";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicId(String);

impl From<String> for TopicId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TopicId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl FromStr for TopicId {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl AsRef<str> for TopicId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    #[serde(rename = "topic_id")]
    #[get = "pub"]
    id: TopicId,
    #[get = "pub"]
    title: String,
    #[get_copy = "pub"]
    team_count: u64,
    #[get_copy = "pub"]
    is_entered: bool,
}

impl Topic {
    pub fn new(
        id: impl Into<TopicId>,
        title: impl Into<String>,
        team_count: u64,
        is_entered: bool,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            team_count,
            is_entered,
        }
    }
}

#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicFile {
    #[get = "pub"]
    filename: String,
    #[serde(deserialize_with = "deserialize_size")]
    #[get_copy = "pub"]
    size: u64,
    #[get = "pub"]
    md5: String,
    #[get = "pub"]
    link: String,
}

impl TopicFile {
    pub fn new(
        filename: impl Into<String>,
        size: u64,
        md5: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            size,
            md5: md5.into(),
            link: link.into(),
        }
    }

    /// Returns the segment of the link path after the first `___`.
    pub fn local_file_name(&self) -> Option<&str> {
        let path = self.link.split(|c| c == '?' || c == '#').next()?;
        let index = path.find(LINK_DELIMITER)?;
        let name = &path[index + LINK_DELIMITER.len()..];
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

/// The server sends file sizes either as a number or as a numeric string.
fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(u64),
        Text(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(size) => Ok(size),
        Size::Text(text) => text.trim().parse().map_err(de::Error::custom),
    }
}

/// One file transfer: where to fetch from and which local name to write to.
#[derive(Serialize, Getters, Debug, Clone, PartialEq, Eq, Hash)]
#[get = "pub"]
pub struct DownloadTask {
    url: Url,
    file_name: String,
}

impl DownloadTask {
    pub fn new(url: Url, file_name: impl Into<String>) -> Self {
        Self {
            url,
            file_name: file_name.into(),
        }
    }

    /// Derives the task for `file`, whose link is relative to `website_url`.
    pub fn from_topic_file(
        website_url: &Url,
        file: &TopicFile,
    ) -> std::result::Result<Self, TaskError> {
        let file_name = file
            .local_file_name()
            .ok_or_else(|| TaskError::MissingFileName(file.link().to_owned()))?;
        let url_str = format!(
            "{}{}",
            website_url.as_str().trim_end_matches('/'),
            file.link()
        );
        let url = Url::parse(&url_str).map_err(|_| TaskError::InvalidLink(file.link().to_owned()))?;
        if !stays_below(file_name) {
            return Err(TaskError::UnsafeFileName(file_name.to_owned()));
        }
        Ok(Self::new(url, file_name))
    }
}

/// Whether `name` only descends from the directory it is joined to.
fn stays_below(name: &str) -> bool {
    !name.starts_with('~')
        && Path::new(name)
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Could not find file name in link : {0}")]
    MissingFileName(String),
    #[error("Could not build download url from link : {0}")]
    InvalidLink(String),
    #[error("File name points outside the working directory : {0}")]
    UnsafeFileName(String),
}

/// A result file to upload for a topic. The file is known to exist.
#[derive(Serialize, Getters, Debug, Clone, PartialEq, Eq, Hash)]
#[get = "pub"]
pub struct SubmissionRequest {
    topic_id: TopicId,
    path: AbsPathBuf,
}

impl SubmissionRequest {
    /// Resolves `file_path` against `base_dir` and checks that it is a readable file.
    pub fn new(
        topic_id: TopicId,
        file_path: &str,
        base_dir: &AbsPathBuf,
    ) -> std::result::Result<Self, SubmissionError> {
        let not_found = || SubmissionError::FileNotFound(file_path.to_owned());
        let path = base_dir.join_expand(file_path);
        if !path.is_file() {
            return Err(not_found());
        }
        Ok(Self { topic_id, path })
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error(r#"Your file "{0}" does not exist. Please check again!"#)]
    FileNotFound(String),
}
