use std::env::current_dir;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use serde::Serialize;

use crate::Result;

/// Expands a leading tilde only. `$` is kept as part of the name.
fn expand_tilde<P: AsRef<Path>>(path: P) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.as_ref().to_string_lossy()).as_ref())
}

/// An absolute (not necessarily canonicalized) path that may or may not exist.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbsPathBuf(PathBuf);

impl AbsPathBuf {
    /// Construct an absolute path.
    ///
    /// Returns error if `path` is not absolute.
    pub fn try_new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(anyhow!("Path is not absolute : {}", path.display()));
        }
        let mut ret = Self(PathBuf::new());
        ret.push(path);
        Ok(ret)
    }

    /// Returns current directory as an absolute path.
    pub fn cwd() -> Result<Self> {
        Ok(Self(current_dir()?))
    }

    /// Joins path.
    pub fn join<P: AsRef<Path>>(&self, path: P) -> Self {
        Self(self.0.join(path))
    }

    /// Joins path while expanding a leading tilde.
    ///
    /// An expanded absolute path replaces `self` entirely.
    pub fn join_expand<P: AsRef<Path>>(&self, path: P) -> Self {
        self.join(expand_tilde(path))
    }

    fn push<P: AsRef<Path>>(&mut self, path: P) {
        self.0.push(path)
    }

    /// Returns parent path.
    pub fn parent(&self) -> Option<Self> {
        self.0.parent().map(|parent| Self(parent.to_owned()))
    }

    pub fn exists(&self) -> bool {
        self.0.exists()
    }

    pub fn is_file(&self) -> bool {
        self.0.is_file()
    }

    pub fn remove_file_pretty(
        &self,
        base_dir: Option<&AbsPathBuf>,
        cnsl: &mut dyn Write,
    ) -> Result<bool> {
        write!(
            cnsl,
            "Removing {} ... ",
            self.strip_prefix_if(base_dir).display()
        )?;
        let result = if self.exists() {
            self.remove_file().map(|_| true)
        } else {
            Ok(false)
        };
        let msg = match result {
            Ok(true) => "removed",
            Ok(false) => "not existed",
            Err(_) => "failed",
        };
        writeln!(cnsl, "{}", msg)?;
        result
    }

    fn remove_file(&self) -> Result<()> {
        fs::remove_file(self.as_ref())?;
        Ok(())
    }

    pub fn create_dir_all(&self) -> io::Result<()> {
        fs::create_dir_all(self.as_ref())
    }

    /// Creates the file (and missing parent directories), truncating existing content.
    pub fn create_dir_all_and_create(&self) -> io::Result<fs::File> {
        if let Some(dir) = self.parent() {
            dir.create_dir_all()?
        }
        fs::File::create(&self.0)
    }

    fn strip_prefix_if(&self, base: Option<&AbsPathBuf>) -> &Path {
        base.and_then(|base| self.0.strip_prefix(&base.0).ok())
            .unwrap_or_else(|| self.0.as_path())
    }
}

impl AsRef<PathBuf> for AbsPathBuf {
    fn as_ref(&self) -> &PathBuf {
        &self.0
    }
}

impl fmt::Display for AbsPathBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.display().fmt(f)
    }
}
