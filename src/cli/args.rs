//! Command line argument parsing

use crate::config::Config;
use crate::core::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Scrape video metadata from packed embed players
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output directory for scraped artifacts
    #[arg(short, long, value_name = "DIR", global = true)]
    pub output: Option<PathBuf>,

    /// Engine used to evaluate packed scripts
    #[arg(long, value_enum, global = true)]
    pub engine: Option<EngineArg>,

    /// HTTP timeout (e.g., 30s, 1m)
    #[arg(long, value_name = "DURATION", global = true)]
    pub timeout: Option<humantime::Duration>,

    /// HTTP retries for transient errors
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Embed page prefix the video id is appended to
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Value of the `ref` query parameter
    #[arg(long, global = true)]
    pub referer: Option<String>,

    /// Override Cookie header
    #[arg(long, global = true)]
    pub cookie: Option<String>,

    /// Override User-Agent header
    #[arg(long, value_name = "USER_AGENT", global = true)]
    pub user_agent: Option<String>,

    /// Path to the ffmpeg executable
    #[arg(long, value_name = "PATH", global = true)]
    pub ffmpeg: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
    },
    /// Scrape a video and print its information as JSON
    Info {
        /// Video id or embed page URL
        video: String,
    },
    /// Scrape a video and download a source with ffmpeg
    Download {
        /// Video id or embed page URL
        video: String,
        /// Index of the source to download (default: first HLS source)
        #[arg(short, long)]
        source: Option<usize>,
        /// Output file name without extension
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Unpack a packed script and print the formatted source
    Unpack {
        /// Script file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Unpack a packed script and print the extracted metadata as JSON
    Extract {
        /// Script file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },
}

/// Packed script evaluation engine
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum EngineArg {
    /// Embedded V8 isolate
    Sandbox,
    /// Native packer decoder
    Native,
}

impl From<EngineArg> for Engine {
    fn from(engine: EngineArg) -> Self {
        match engine {
            EngineArg::Sandbox => Engine::Sandbox,
            EngineArg::Native => Engine::Native,
        }
    }
}

impl Cli {
    /// Apply command line overrides on top of `base`
    pub fn to_config(&self, base: Config) -> Config {
        let mut config = base;

        if let Some(output) = &self.output {
            config = config.with_output_dir(output);
        }
        if let Some(engine) = self.engine {
            config = config.with_engine(engine.into());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout.into());
        }
        if let Some(retries) = self.retries {
            config = config.with_max_retries(retries);
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(referer) = &self.referer {
            config = config.with_referer(referer);
        }
        if let Some(cookie) = &self.cookie {
            config = config.with_cookie(cookie);
        }
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent);
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            config = config.with_ffmpeg_path(ffmpeg);
        }
        if let Command::Serve { port, host } = &self.command {
            let host = host.clone().unwrap_or_else(|| config.host.clone());
            let port = port.unwrap_or(config.port);
            config = config.with_bind(host, port);
        }

        config
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("vscrape").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_subcommands() {
        assert_eq!(
            parse(&["info", "9q4yh8ji5k4w"]).command,
            Command::Info {
                video: "9q4yh8ji5k4w".to_string()
            }
        );
        assert_eq!(
            parse(&["download", "abc", "--source", "1", "--name", "clip"]).command,
            Command::Download {
                video: "abc".to_string(),
                source: Some(1),
                name: Some("clip".to_string()),
            }
        );
        assert_eq!(
            parse(&["unpack"]).command,
            Command::Unpack {
                input: "-".to_string()
            }
        );
        assert_eq!(
            parse(&["extract", "player.js"]).command,
            Command::Extract {
                input: "player.js".to_string()
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["info", "abc", "--engine", "native", "--timeout", "1m", "-v"]);
        assert_eq!(cli.engine, Some(EngineArg::Native));
        assert_eq!(cli.timeout.map(Duration::from), Some(Duration::from_secs(60)));
        assert_eq!(cli.verbosity_level(), VerbosityLevel::Verbose);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["vscrape", "-v", "-q", "info", "abc"]).is_err());
    }

    #[test]
    fn test_verbosity_level() {
        assert_eq!(parse(&["info", "a"]).verbosity_level(), VerbosityLevel::Normal);
        assert_eq!(parse(&["-q", "info", "a"]).verbosity_level(), VerbosityLevel::Quiet);
    }

    #[test]
    fn test_to_config_overrides() {
        let cli = parse(&[
            "--output",
            "/tmp/out",
            "--engine",
            "native",
            "--retries",
            "5",
            "--base-url",
            "https://embed.example/e",
            "--referer",
            "",
            "--cookie",
            "a=1",
            "--ffmpeg",
            "/usr/bin/ffmpeg",
            "info",
            "abc",
        ]);
        let config = cli.to_config(Config::default());

        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.engine, Engine::Native);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.page_base_url, "https://embed.example/e");
        assert_eq!(config.referer, "");
        assert_eq!(config.cookie, "a=1");
        assert_eq!(config.ffmpeg_path, PathBuf::from("/usr/bin/ffmpeg"));
    }

    #[test]
    fn test_to_config_keeps_base_without_flags() {
        let base = Config::default().with_cookie("from=env");
        let config = parse(&["info", "abc"]).to_config(base.clone());

        assert_eq!(config.cookie, "from=env");
        assert_eq!(config.timeout, base.timeout);
        assert_eq!(config.engine, base.engine);
    }

    #[test]
    fn test_serve_bind_override() {
        let config = parse(&["serve", "--port", "8080", "--host", "127.0.0.1"])
            .to_config(Config::default());
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_engine_arg_conversion() {
        assert_eq!(Engine::from(EngineArg::Sandbox), Engine::Sandbox);
        assert_eq!(Engine::from(EngineArg::Native), Engine::Native);
    }
}
