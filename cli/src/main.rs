//! `fetch-url`: write the body of one URL to stdout.

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use fetch_core::config::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_EXPECTED_STATUS, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT,
};
use fetch_core::{Client, FetchConfig, FetchError, RetryPolicy};
use log::{debug, error};

#[derive(Debug, Parser)]
#[command(name = "fetch-url", version, about = "Fetch a document over raw HTTP/1.1 and print its body")]
struct Args {
    /// URL of the form scheme://host[:port][/path], scheme http or https
    url: String,

    /// Retries after the first failed attempt
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    retries: u32,

    /// Connect/read timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs_f64())]
    timeout: f64,

    /// Backoff factor in seconds; retry k waits factor * 2^(k-1)
    #[arg(long, default_value_t = DEFAULT_BACKOFF_FACTOR.as_secs_f64())]
    backoff: f64,

    /// User-Agent header value
    #[arg(long)]
    user_agent: Option<String>,

    /// Username for HTTP Basic authentication
    #[arg(long, requires = "password")]
    user: Option<String>,

    /// Password for HTTP Basic authentication
    #[arg(long, requires = "user")]
    password: Option<String>,

    /// Status code that counts as success
    #[arg(long, default_value_t = DEFAULT_EXPECTED_STATUS)]
    expect_status: u16,

    /// Space attempts, retries included, to at most this many per minute
    #[arg(long)]
    rate_limit: Option<u32>,

    /// Log request progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn fetch_config(&self) -> FetchConfig {
        let mut config = FetchConfig::default()
            .with_expected_status(self.expect_status)
            .with_timeout(seconds(self.timeout));
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        if let (Some(user), Some(password)) = (&self.user, &self.password) {
            config = config.with_basic_auth(user, password);
        }
        config
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(self.retries)
            .with_backoff_factor(seconds(self.backoff))
    }

    fn client(&self) -> Client {
        let client = Client::new(self.fetch_config()).with_retry_policy(self.retry_policy());
        match self.rate_limit {
            Some(limit) => client.with_rate_limit(limit),
            None => client,
        }
    }
}

/// Negative, NaN and out-of-range inputs fall back to zero.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn retrieve(args: &Args) -> Result<Vec<u8>, FetchError> {
    let client = args.client();
    debug!("fetching {} with {:?}", args.url, client.config());
    client.fetch_with_retry(&args.url).map(|response| response.body)
}

fn run(args: &Args) -> ExitCode {
    let body = match retrieve(args) {
        Ok(body) => body,
        Err(e) => {
            debug!("fetch failed: {e}");
            eprintln!("Failed to retrieve {}", args.url);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(&body).and_then(|()| stdout.flush()) {
        error!("writing body to stdout: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    run(&args)
}
