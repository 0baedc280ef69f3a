//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

/// Download the Benzinga news feed for a range of dates.
///
/// Each page is stored verbatim as `benzinga_api_{minId}_{maxId}.json` under a
/// per-date directory, so re-running a date rewrites the same files.
#[derive(Parser, Debug)]
#[command(name = "benzinga-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// First date to download, YYYY-MM-DD [default: three days before --end]
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last date to download, YYYY-MM-DD [default: yesterday, UTC]
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// API token [default: $BENZINGA_API_KEY, then `api_key` from the config file]
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Root directory for per-date page folders [default: /tmp/raw/alternative/benzinga]
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory of consolidated daily files removed before each date [default: /tmp/benzinga-daily]
    #[arg(long, value_name = "DIR")]
    pub daily_dir: Option<PathBuf>,

    /// Fail instead of replacing a page file that already exists
    #[arg(long)]
    pub no_overwrite: bool,

    /// Minimum delay between requests in milliseconds (0 to disable, max 60000) [default: 500]
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub rate_limit: Option<u64>,

    /// Retries per page after the first attempt for transient failures (0-10) [default: 2]
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(0..=10))]
    pub max_retries: Option<u32>,

    /// Pages fetched per date before giving up (1-100000) [default: 1000]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100_000))]
    pub max_pages: Option<u32>,

    /// API base URL [default: https://api.benzinga.com/api/v2]
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Config file [default: $XDG_CONFIG_HOME/benzinga-downloader/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["benzinga-downloader"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.start.is_none());
        assert!(args.end.is_none());
        assert!(args.api_key.is_none());
        assert!(!args.no_overwrite);
        assert!(args.rate_limit.is_none());
        assert!(args.max_retries.is_none());
        assert!(args.max_pages.is_none());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["benzinga-downloader", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["benzinga-downloader", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["benzinga-downloader", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["benzinga-downloader", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["benzinga-downloader", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    // ==================== Date Tests ====================

    #[test]
    fn test_cli_parses_dates() {
        let args = Args::try_parse_from([
            "benzinga-downloader",
            "--start",
            "2020-03-01",
            "--end",
            "2020-03-04",
        ])
        .unwrap();
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2020, 3, 1));
        assert_eq!(args.end, NaiveDate::from_ymd_opt(2020, 3, 4));
    }

    #[test]
    fn test_cli_rejects_malformed_date() {
        let err =
            Args::try_parse_from(["benzinga-downloader", "--start", "03/01/2020"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_reversed_dates_parse() {
        // Ordering is checked by the range driver, not the parser
        let args = Args::try_parse_from([
            "benzinga-downloader",
            "--start",
            "2020-03-05",
            "--end",
            "2020-03-04",
        ])
        .unwrap();
        assert!(args.end < args.start);
    }

    // ==================== Output Tests ====================

    #[test]
    fn test_cli_output_dirs() {
        let args = Args::try_parse_from([
            "benzinga-downloader",
            "-o",
            "/data/news",
            "--daily-dir",
            "/data/daily",
            "--no-overwrite",
        ])
        .unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("/data/news")));
        assert_eq!(args.daily_dir, Some(PathBuf::from("/data/daily")));
        assert!(args.no_overwrite);
    }

    // ==================== Rate Limit Tests ====================

    #[test]
    fn test_cli_rate_limit_short_flag() {
        let args = Args::try_parse_from(["benzinga-downloader", "-l", "2000"]).unwrap();
        assert_eq!(args.rate_limit, Some(2000));
    }

    #[test]
    fn test_cli_rate_limit_zero_disables() {
        let args = Args::try_parse_from(["benzinga-downloader", "--rate-limit", "0"]).unwrap();
        assert_eq!(args.rate_limit, Some(0));
    }

    #[test]
    fn test_cli_rate_limit_over_max_rejected() {
        let err = Args::try_parse_from(["benzinga-downloader", "-l", "60001"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    // ==================== Max Retries Tests ====================

    #[test]
    fn test_cli_max_retries_short_flag() {
        let args = Args::try_parse_from(["benzinga-downloader", "-r", "5"]).unwrap();
        assert_eq!(args.max_retries, Some(5));
    }

    #[test]
    fn test_cli_max_retries_over_max_rejected() {
        let err = Args::try_parse_from(["benzinga-downloader", "-r", "11"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    // ==================== Max Pages Tests ====================

    #[test]
    fn test_cli_max_pages_bounds() {
        let args = Args::try_parse_from(["benzinga-downloader", "--max-pages", "1"]).unwrap();
        assert_eq!(args.max_pages, Some(1));

        let err = Args::try_parse_from(["benzinga-downloader", "--max-pages", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let err =
            Args::try_parse_from(["benzinga-downloader", "--max-pages", "100001"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_api_key_and_base_url() {
        let args = Args::try_parse_from([
            "benzinga-downloader",
            "--api-key",
            "abc",
            "--base-url",
            "http://localhost:9000/api/v2",
            "--config",
            "/etc/benzinga.toml",
        ])
        .unwrap();
        assert_eq!(args.api_key.as_deref(), Some("abc"));
        assert_eq!(args.base_url.as_deref(), Some("http://localhost:9000/api/v2"));
        assert_eq!(args.config, Some(PathBuf::from("/etc/benzinga.toml")));
    }
}
