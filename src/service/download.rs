use std::io::{self, Read, Write};

use indicatif::ProgressBar;
use reqwest::blocking::Client;
use reqwest::header::COOKIE;
use reqwest::StatusCode;
use thiserror::Error;

use crate::abs_path::AbsPathBuf;
use crate::console::{Console, PbTarget};
use crate::credential::Credential;
use crate::model::DownloadTask;

use super::request::{describe_error, SendPretty as _};

const CHUNK_SIZE: usize = 8 * 1024;

/// Observer of a single transfer.
pub trait Progress {
    /// Called once before the first chunk. `total` is `None` if the size is unknown.
    fn start(&mut self, total: Option<u64>);

    fn advance(&mut self, bytes: u64);

    fn finish(&mut self);
}

/// Draws a progress bar on the console the downloader was handed.
#[derive(Debug)]
pub struct ConsoleProgress {
    target: PbTarget,
    pb: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new(cnsl: &Console) -> Self {
        Self {
            target: cnsl.pb_target(),
            pb: None,
        }
    }
}

impl Progress for ConsoleProgress {
    fn start(&mut self, total: Option<u64>) {
        self.pb = Some(self.target.build_pb_bytes(total));
    }

    fn advance(&mut self, bytes: u64) {
        if let Some(pb) = &self.pb {
            pb.inc(bytes);
        }
    }

    fn finish(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.finish();
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    #[error(r#"Skip file "{0}""#)]
    Skipped(String),
    #[error("Received status code {0}")]
    Http(u16),
    #[error("Can not download file {0}")]
    Failed(String),
    #[error("Could not prepare {path} : {message}")]
    LocalIo { path: String, message: String },
}

impl DownloadError {
    /// A skip is the user's choice, not a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Streams remote files to disk, one at a time.
#[derive(Debug, Clone)]
pub struct FileDownloader {
    client: Client,
    base_dir: AbsPathBuf,
}

impl FileDownloader {
    /// Relative file names are resolved against `base_dir`.
    pub fn new(client: Client, base_dir: AbsPathBuf) -> Self {
        Self { client, base_dir }
    }

    /// Downloads `task` and returns the number of bytes written.
    ///
    /// An existing destination is only overwritten after confirmation, and only once the
    /// server has answered 200.
    pub fn download(
        &self,
        task: &DownloadTask,
        credential: &Credential,
        cnsl: &mut Console,
        progress: &mut dyn Progress,
    ) -> Result<u64, DownloadError> {
        let file_name = task.file_name();
        let path = self.base_dir.join_expand(file_name);

        if path.exists() {
            let message = format!(r#"File "{}" exists. Continue and overwrite?"#, file_name);
            let overwrite = cnsl
                .confirm(&message)
                .map_err(|err| local_io(file_name, err.to_string()))?;
            if !overwrite {
                return Err(DownloadError::Skipped(file_name.to_owned()));
            }
        }
        if let Some(dir) = path.parent() {
            dir.create_dir_all()
                .map_err(|err| local_io(&dir.to_string(), err.to_string()))?;
        }

        let url = task.url().as_str();
        let mut res = self
            .client
            .get(task.url().clone())
            .header(COOKIE, credential.cookie())
            .send_pretty(&self.client, cnsl)
            .map_err(|err| fail(cnsl, url, &describe_error(err)))?;
        if res.status() != StatusCode::OK {
            return Err(DownloadError::Http(res.status().as_u16()));
        }
        let total = known_size(res.content_length());

        let mut file = path
            .create_dir_all_and_create()
            .map_err(|err| fail(cnsl, url, &format!("Could not create {} : {}", path, err)))?;
        progress.start(total);
        let result = copy_chunks(&mut res, &mut file, progress);
        progress.finish();
        let written = result.map_err(|err| fail(cnsl, url, &err.to_string()))?;
        log::debug!("Wrote {} bytes to {}", written, path);
        Ok(written)
    }
}

/// An absent or zero `Content-Length` means the size is unknown.
fn known_size(content_length: Option<u64>) -> Option<u64> {
    content_length.filter(|&len| len > 0)
}

fn local_io(path: &str, message: String) -> DownloadError {
    DownloadError::LocalIo {
        path: path.to_owned(),
        message,
    }
}

fn fail(cnsl: &mut Console, url: &str, cause: &str) -> DownloadError {
    cnsl.warn(cause).unwrap_or(());
    DownloadError::Failed(url.to_owned())
}

fn copy_chunks(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    progress: &mut dyn Progress,
) -> io::Result<u64> {
    let mut buf = [0; CHUNK_SIZE];
    let mut written = 0;
    loop {
        let len = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(len) => len,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        writer.write_all(&buf[..len])?;
        written += len as u64;
        progress.advance(len as u64);
    }
    writer.flush()?;
    Ok(written)
}
