use std::time::Duration;

use anyhow::{anyhow, Context as _};
use getset::{CopyGetters, Getters};
use reqwest::blocking::Client;
use url::Url;

use crate::abs_path::AbsPathBuf;
use crate::credential::CredentialStore;
use crate::{GlobalOpt, Result};

pub static DEFAULT_WEBSITE_URL: &str = "https://aidea-web.tw";

static API_PATH_SEGMENTS: &[&str] = &["api", "v1"];

static CONFIG_DIR_NAME: &str = ".aidea";

static CONFIG_FILE_NAME: &str = "config.txt";

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));

#[derive(Getters, Debug, Clone, PartialEq, Eq)]
#[get = "pub"]
pub struct Config {
    website_url: Url,
    credential_path: AbsPathBuf,
    /// Directory that relative download and submission paths are resolved against.
    base_dir: AbsPathBuf,
    session: SessionConfig,
}

impl Config {
    pub fn new(
        website_url: Url,
        credential_path: AbsPathBuf,
        base_dir: AbsPathBuf,
        session: SessionConfig,
    ) -> Result<Self> {
        if website_url.cannot_be_a_base() {
            return Err(anyhow!("Website url cannot be a base url : {}", website_url));
        }
        Ok(Self {
            website_url,
            credential_path,
            base_dir,
            session,
        })
    }

    pub fn load(global_opt: &GlobalOpt) -> Result<Self> {
        let session = SessionConfig {
            timeout: global_opt.timeout,
        };
        Self::new(
            global_opt.website_url.clone(),
            Self::default_credential_path()?,
            AbsPathBuf::cwd().context("Could not get current directory")?,
            session,
        )
    }

    /// `<home>/.aidea/config.txt`
    pub fn default_credential_path() -> Result<AbsPathBuf> {
        let home = dirs::home_dir().context("Could not get home dir")?;
        AbsPathBuf::try_new(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::new(self.credential_path.clone())
    }

    /// Builds the url of an api endpoint, percent-encoding each segment.
    pub fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.website_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(API_PATH_SEGMENTS)
                .extend(segments);
        }
        url
    }

    pub fn build_client(&self) -> Result<Client> {
        self.session
            .client_builder()
            .build()
            .context("Could not setup client. TLS backend cannot be initialized, or the resolver cannot load the system configuration.")
    }
}

#[derive(CopyGetters, Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct SessionConfig {
    /// No timeout if `None`; a hung connection then blocks until the peer gives up.
    #[get_copy = "pub"]
    timeout: Option<Duration>,
}

impl SessionConfig {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn client_builder(&self) -> reqwest::blocking::ClientBuilder {
        Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
    }
}
