//! Runtime configuration

use crate::core::Engine;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Firefox desktop profile the embed host expects
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0";

/// Cookie header sent with every page request
pub const DEFAULT_COOKIE: &str =
    "file_id=43620805; aff=40302; ref_url=animedub.pro; lang=1; prefetchAd_9254409=true";

pub const DEFAULT_BASE_URL: &str = "https://zpjid.com/bkg";
pub const DEFAULT_REFERER: &str = "animedub.pro";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Scraper, server and downloader settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the API server binds to
    pub port: u16,
    /// Address the API server binds to
    pub host: String,
    /// Root of the per-video output layout
    pub output_dir: PathBuf,
    /// Embed page prefix; the video id is appended as a path segment
    pub page_base_url: String,
    /// Value of the `ref` query parameter
    pub referer: String,
    /// Cookie header
    pub cookie: String,
    /// User-Agent header
    pub user_agent: String,
    /// Deobfuscation engine
    pub engine: Engine,
    /// ffmpeg executable
    pub ffmpeg_path: PathBuf,
    /// HTTP timeout
    pub timeout: Duration,
    /// Retries for transient fetch failures
    pub max_retries: u32,
    /// How long scraped records and unpacked sources stay cached
    pub cache_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_string(),
            output_dir: PathBuf::from("output"),
            page_base_url: DEFAULT_BASE_URL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            cookie: DEFAULT_COOKIE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            engine: Engine::default(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            cache_ttl: Duration::from_secs(600),
        }
    }
}

impl Config {
    /// Defaults overridden by process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns.
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => warn!("Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(dir) = lookup("VSCRAPE_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(base) = lookup("VSCRAPE_BASE_URL") {
            config.page_base_url = base;
        }
        if let Some(referer) = lookup("VSCRAPE_REFERER") {
            config.referer = referer;
        }
        if let Some(cookie) = lookup("VSCRAPE_COOKIE") {
            config.cookie = cookie;
        }
        if let Some(engine) = lookup("VSCRAPE_ENGINE") {
            match engine.parse::<Engine>() {
                Ok(engine) => config.engine = engine,
                Err(e) => warn!("Ignoring VSCRAPE_ENGINE: {}", e),
            }
        }
        if let Some(ffmpeg) = lookup("FFMPEG_PATH") {
            config.ffmpeg_path = PathBuf::from(ffmpeg);
        }

        config
    }

    /// Set output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set embed page prefix
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.page_base_url = base.into();
        self
    }

    /// Set referer query value
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    /// Set cookie header
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = cookie.into();
        self
    }

    /// Set User-Agent header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set deobfuscation engine
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Set ffmpeg executable
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    /// Set HTTP timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set maximum retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set server bind address
    pub fn with_bind(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// `host[:port]` of the embed page, used for the `Host` and `Alt-Used` headers
    pub fn page_host(&self) -> String {
        let Ok(url) = Url::parse(&self.page_base_url) else {
            return String::new();
        };
        match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => String::new(),
        }
    }
}
