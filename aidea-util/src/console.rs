use std::env;
use std::io::{self, BufRead as _, Write};

use anyhow::Context as _;
use console::Term;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

static PB_TICK_INTERVAL_MS: u64 = 50;
static PB_TEMPL_BYTES: &str =
    "{spinner:.green} {prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] \
     {bytes:>9}/{total_bytes:>9} {bytes_per_sec:>11} ETA {eta:>3}";
static PB_TEMPL_BYTES_UNKNOWN: &str =
    "{spinner:.green} {prefix} [{elapsed_precise}] {bytes:>9} {bytes_per_sec:>11}";
static PB_PREFIX_UNKNOWN: &str = "(Unknown file size)";
static PB_PROGRESS_CHARS: &str = "#>-";

#[derive(Debug)]
enum Inner {
    Term(Term),
    Buf {
        input: io::BufReader<io::Cursor<String>>,
        output: Vec<u8>,
    },
    Sink(io::Sink),
}

/// Config for console.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct ConsoleConfig {
    /// If true, assumes yes and skips any confirmation.
    pub assume_yes: bool,
}

#[derive(Debug)]
pub struct Console {
    inner: Inner,
    conf: ConsoleConfig,
}

impl Console {
    pub fn term(conf: ConsoleConfig) -> Self {
        Self {
            inner: Inner::Term(Term::stderr()),
            conf,
        }
    }

    pub fn buf(conf: ConsoleConfig) -> Self {
        Self::buf_with_input(conf, "")
    }

    /// Buffered console that answers prompts from `input`, line by line.
    pub fn buf_with_input(conf: ConsoleConfig, input: &str) -> Self {
        Self {
            inner: Inner::Buf {
                input: io::BufReader::new(io::Cursor::new(input.to_owned())),
                output: Vec::new(),
            },
            conf,
        }
    }

    pub fn sink(conf: ConsoleConfig) -> Self {
        Self {
            inner: Inner::Sink(io::sink()),
            conf,
        }
    }

    pub fn take_buf(self) -> Option<Vec<u8>> {
        match self.inner {
            Inner::Buf { output: buf, .. } => Some(buf),
            _ => None,
        }
    }

    pub fn take_output(self) -> crate::Result<String> {
        self.take_buf()
            .context("Could not take buf from console")
            .and_then(|buf| Ok(String::from_utf8(buf)?))
    }

    #[inline]
    fn as_mut_write(&mut self) -> &mut dyn Write {
        match self.inner {
            Inner::Term(ref mut w) => w,
            Inner::Buf {
                output: ref mut w, ..
            } => w,
            Inner::Sink(ref mut w) => w,
        }
    }

    pub fn warn(&mut self, message: &str) -> io::Result<()> {
        writeln!(self, "{} {}", sty_y("WARN:"), message)
    }

    /// Asks a yes/no question until a non-empty answer is given.
    ///
    /// Only `y` (case-insensitive) confirms. End of input counts as no.
    pub fn confirm(&mut self, message: &str) -> io::Result<bool> {
        if self.conf.assume_yes {
            return Ok(true);
        }

        let prompt = format!("{} (Y/N) ", message);
        loop {
            let input = match self.prompt_and_read(&prompt, false) {
                Ok(input) => input,
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    writeln!(self)?;
                    return Ok(false);
                }
                Err(err) => return Err(err),
            };
            let answer = input.trim();
            if !answer.is_empty() {
                return Ok(answer.eq_ignore_ascii_case("y"));
            }
        }
    }

    pub fn get_env_or_prompt_and_read(
        &mut self,
        env_name: &str,
        prompt: &str,
        is_password: bool,
    ) -> io::Result<String> {
        if let Ok(val) = env::var(env_name) {
            writeln!(
                self,
                "{}{:16} (read from env {})",
                prompt,
                if is_password { "********" } else { &val },
                env_name
            )?;
            return Ok(val);
        };
        self.prompt_and_read(prompt, is_password)
    }

    fn read_user(&mut self, is_password: bool) -> io::Result<String> {
        match self.inner {
            Inner::Term(ref term) if term.is_term() => {
                if is_password {
                    term.read_secure_line()
                } else {
                    term.read_line()
                }
            }
            Inner::Term(_) => read_line_from(&mut io::stdin().lock()),
            Inner::Buf { ref mut input, .. } => read_line_from(input),
            Inner::Sink(_) => Err(io::ErrorKind::UnexpectedEof.into()),
        }
    }

    fn prompt(&mut self, prompt: &str) -> io::Result<()> {
        write!(self, "{}", prompt)?;
        self.flush()?;
        Ok(())
    }

    fn prompt_and_read(&mut self, prompt: &str, is_password: bool) -> io::Result<String> {
        self.prompt(prompt)?;
        self.read_user(is_password)
    }

    /// Returns where progress bars of this console are drawn.
    pub fn pb_target(&self) -> PbTarget {
        match &self.inner {
            Inner::Term(term) => PbTarget::Term(term.clone()),
            _ => PbTarget::Hidden,
        }
    }

    pub fn build_pb_bytes(&self, len: Option<u64>) -> ProgressBar {
        self.pb_target().build_pb_bytes(len)
    }
}

impl Write for Console {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.as_mut_write().write(buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.as_mut_write().flush()
    }
}

fn read_line_from(reader: &mut dyn io::BufRead) -> io::Result<String> {
    let mut buf = String::new();
    if reader.read_line(&mut buf)? == 0 {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    let len = buf.trim_end_matches(&['\r', '\n'][..]).len();
    buf.truncate(len);
    Ok(buf)
}

/// Draw target of progress bars, detached from the console that created it.
#[derive(Debug, Clone)]
pub enum PbTarget {
    Term(Term),
    Hidden,
}

impl PbTarget {
    /// Builds a byte-count progress bar, or a size-less spinner if `len` is unknown.
    pub fn build_pb_bytes(&self, len: Option<u64>) -> ProgressBar {
        let (pb, style) = match len {
            Some(len) => (
                ProgressBar::with_draw_target(len, self.to_draw_target()),
                ProgressStyle::default_bar()
                    .template(PB_TEMPL_BYTES)
                    .progress_chars(PB_PROGRESS_CHARS),
            ),
            None => (
                ProgressBar::with_draw_target(!0, self.to_draw_target()),
                ProgressStyle::default_spinner().template(PB_TEMPL_BYTES_UNKNOWN),
            ),
        };
        pb.set_style(style);
        if len.is_none() {
            pb.set_prefix(PB_PREFIX_UNKNOWN);
        }
        pb.enable_steady_tick(PB_TICK_INTERVAL_MS);
        pb
    }

    fn to_draw_target(&self) -> ProgressDrawTarget {
        match self {
            Self::Term(term) => ProgressDrawTarget::to_term(term.clone(), None),
            Self::Hidden => ProgressDrawTarget::hidden(),
        }
    }
}

macro_rules! def_color {
    ($name:ident, $name_upper:ident, $style:expr) => {
        ::lazy_static::lazy_static! {
            static ref $name_upper: ::console::Style = {
                use ::console::Style;
                $style
            };
        }

        pub fn $name<D>(val: D) -> ::console::StyledObject<D> {
            $name_upper.apply_to(val)
        }
    };
}

pub use color_defs::*;

#[cfg_attr(tarpaulin, ignore)]
mod color_defs {
    def_color!(sty_r, STY_R, Style::new().red());
    def_color!(sty_g, STY_G, Style::new().green());
    def_color!(sty_y, STY_Y, Style::new().yellow());
}
