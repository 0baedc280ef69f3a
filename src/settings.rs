//! Merges CLI flags, environment, and config file into run settings.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use benzinga_core::download::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BASE_URL, DEFAULT_MAX_PAGES, DEFAULT_RATE_LIMIT,
    READ_TIMEOUT_SECS,
};
use benzinga_core::download::{DEFAULT_MAX_RETRIES, DownloadOptions, FetcherConfig, RetryPolicy};
use chrono::{Days, NaiveDate};

use crate::cli::Args;
use crate::config::FileConfig;

/// Environment variable consulted for the API token.
pub const API_KEY_ENV: &str = "BENZINGA_API_KEY";

const DEFAULT_OUTPUT_DIR: &str = "/tmp/raw/alternative/benzinga";
const DEFAULT_DAILY_DIR: &str = "/tmp/benzinga-daily";

/// Days before `end` that the default start date falls on.
const DEFAULT_RANGE_DAYS: u64 = 3;

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub output_dir: PathBuf,
    pub daily_dir: PathBuf,
    pub force_overwrite: bool,
    pub rate_limit: Duration,
    pub max_retries: u32,
    pub max_pages: u32,
    pub fetcher: FetcherConfig,
}

impl Settings {
    /// Resolves settings. Precedence: CLI flag, then environment (API key
    /// only), then config file, then built-in default.
    ///
    /// `today` is the current UTC date; the default range ends yesterday.
    pub fn resolve(
        args: &Args,
        file: &FileConfig,
        env_api_key: Option<String>,
        today: NaiveDate,
    ) -> Result<Self> {
        let api_key = args
            .api_key
            .clone()
            .or(env_api_key)
            .or_else(|| file.api_key.clone())
            .filter(|key| !key.trim().is_empty());
        let Some(api_key) = api_key else {
            bail!("No API key: pass --api-key, set {API_KEY_ENV}, or set `api_key` in the config file");
        };

        let end = match args.end {
            Some(end) => end,
            None => previous_day(today)?,
        };
        let start = match args.start {
            Some(start) => start,
            None => end
                .checked_sub_days(Days::new(DEFAULT_RANGE_DAYS))
                .ok_or_else(|| anyhow::anyhow!("Default start date before {end} is out of range"))?,
        };

        let rate_limit = args
            .rate_limit
            .or(file.rate_limit)
            .map_or(DEFAULT_RATE_LIMIT, Duration::from_millis);

        Ok(Self {
            api_key,
            start,
            end,
            output_dir: args
                .output_dir
                .clone()
                .or_else(|| file.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            daily_dir: args
                .daily_dir
                .clone()
                .or_else(|| file.daily_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DAILY_DIR)),
            force_overwrite: !args.no_overwrite && file.force_overwrite.unwrap_or(true),
            rate_limit,
            max_retries: args
                .max_retries
                .or(file.max_retries)
                .unwrap_or(DEFAULT_MAX_RETRIES),
            max_pages: args.max_pages.or(file.max_pages).unwrap_or(DEFAULT_MAX_PAGES),
            fetcher: FetcherConfig {
                base_url: args
                    .base_url
                    .clone()
                    .or_else(|| file.base_url.clone())
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                connect_timeout_secs: file.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
                read_timeout_secs: file.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
            },
        })
    }

    /// Download options for the coordinator.
    #[must_use]
    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            force_overwrite: self.force_overwrite,
            max_pages: self.max_pages,
            retry_policy: RetryPolicy::with_max_retries(self.max_retries),
            ..DownloadOptions::new(&self.output_dir, &self.daily_dir)
        }
    }
}

fn previous_day(today: NaiveDate) -> Result<NaiveDate> {
    today
        .pred_opt()
        .ok_or_else(|| anyhow::anyhow!("No day precedes {today}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, 10).unwrap()
    }

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["benzinga-downloader"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_with_cli_key() {
        let settings =
            Settings::resolve(&args(&["--api-key", "k"]), &FileConfig::default(), None, today())
                .unwrap();
        assert_eq!(settings.api_key, "k");
        assert_eq!(settings.end, NaiveDate::from_ymd_opt(2020, 3, 9).unwrap());
        assert_eq!(settings.start, NaiveDate::from_ymd_opt(2020, 3, 6).unwrap());
        assert_eq!(settings.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(settings.daily_dir, PathBuf::from(DEFAULT_DAILY_DIR));
        assert!(settings.force_overwrite);
        assert_eq!(settings.rate_limit, DEFAULT_RATE_LIMIT);
        assert_eq!(settings.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(settings.download_options().retry_policy.max_attempts(), 3);
        assert_eq!(settings.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(settings.fetcher.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_max_retries_adds_to_first_attempt() {
        let no_retries = Settings::resolve(
            &args(&["--api-key", "k", "-r", "0"]),
            &FileConfig::default(),
            None,
            today(),
        )
        .unwrap();
        assert_eq!(no_retries.download_options().retry_policy.max_attempts(), 1);

        let one_retry = Settings::resolve(
            &args(&["--api-key", "k", "-r", "1"]),
            &FileConfig::default(),
            None,
            today(),
        )
        .unwrap();
        assert_eq!(one_retry.download_options().retry_policy.max_attempts(), 2);
    }

    #[test]
    fn test_start_defaults_relative_to_explicit_end() {
        let settings = Settings::resolve(
            &args(&["--api-key", "k", "--end", "2021-01-02"]),
            &FileConfig::default(),
            None,
            today(),
        )
        .unwrap();
        assert_eq!(settings.start, NaiveDate::from_ymd_opt(2020, 12, 30).unwrap());
    }

    #[test]
    fn test_api_key_precedence() {
        let file = FileConfig {
            api_key: Some("from-file".to_string()),
            ..FileConfig::default()
        };

        let cli = Settings::resolve(
            &args(&["--api-key", "from-cli"]),
            &file,
            Some("from-env".to_string()),
            today(),
        )
        .unwrap();
        assert_eq!(cli.api_key, "from-cli");

        let env = Settings::resolve(&args(&[]), &file, Some("from-env".to_string()), today())
            .unwrap();
        assert_eq!(env.api_key, "from-env");

        let from_file = Settings::resolve(&args(&[]), &file, None, today()).unwrap();
        assert_eq!(from_file.api_key, "from-file");
    }

    #[test]
    fn test_missing_api_key_is_error() {
        let err = Settings::resolve(&args(&[]), &FileConfig::default(), None, today()).unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn test_blank_api_key_is_error() {
        let result = Settings::resolve(
            &args(&["--api-key", "  "]),
            &FileConfig::default(),
            None,
            today(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let file = FileConfig {
            output_dir: Some(PathBuf::from("/file/out")),
            rate_limit: Some(100),
            max_retries: Some(1),
            max_pages: Some(10),
            base_url: Some("http://file".to_string()),
            ..FileConfig::default()
        };
        let settings = Settings::resolve(
            &args(&[
                "--api-key",
                "k",
                "-o",
                "/cli/out",
                "-l",
                "0",
                "-r",
                "7",
                "--max-pages",
                "20",
                "--base-url",
                "http://cli",
            ]),
            &file,
            None,
            today(),
        )
        .unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("/cli/out"));
        assert_eq!(settings.rate_limit, Duration::ZERO);
        assert_eq!(settings.max_retries, 7);
        assert_eq!(settings.max_pages, 20);
        assert_eq!(settings.fetcher.base_url, "http://cli");
    }

    #[test]
    fn test_config_file_fills_unset_flags() {
        let file = FileConfig {
            daily_dir: Some(PathBuf::from("/file/daily")),
            force_overwrite: Some(false),
            connect_timeout_secs: Some(5),
            read_timeout_secs: Some(15),
            ..FileConfig::default()
        };
        let settings = Settings::resolve(&args(&["--api-key", "k"]), &file, None, today()).unwrap();
        assert_eq!(settings.daily_dir, PathBuf::from("/file/daily"));
        assert!(!settings.force_overwrite);
        assert_eq!(settings.fetcher.connect_timeout_secs, 5);
        assert_eq!(settings.fetcher.read_timeout_secs, 15);
    }

    #[test]
    fn test_no_overwrite_flag_wins() {
        let file = FileConfig {
            force_overwrite: Some(true),
            ..FileConfig::default()
        };
        let settings = Settings::resolve(
            &args(&["--api-key", "k", "--no-overwrite"]),
            &file,
            None,
            today(),
        )
        .unwrap();
        assert!(!settings.force_overwrite);
        assert!(!settings.download_options().force_overwrite);
    }
}
