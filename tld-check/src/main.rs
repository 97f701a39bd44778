//! TLD Check CLI Application
//!
//! A command-line interface for checking one keyword across many TLDs using RDAP.
//! This CLI application provides a user-friendly interface to the tld-check-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use console::Term;
use std::process;
use std::time::Instant;
use tld_check_lib::{
    load_env_config, parse_duration_string, CancellationToken, CheckConfig, CheckRequest,
    ConfigManager, DomainCheckResponse, DomainChecker, EndpointResolver, EnvConfig,
    FailurePolicy, FileConfig, PacingPolicy,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for tld-check
#[derive(Parser, Debug)]
#[command(name = "tld-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Check one name across many TLDs using RDAP")]
#[command(
    long_about = "Check one name across many TLDs using RDAP.\n\nGive a keyword (myawesomesite) or a full domain (myawesomesite.com). Without --tld the default set com, id, ai, org, net, io is checked, plus the TLD the name ended with."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Keyword or full domain to check
    #[arg(
        value_name = "NAME",
        required_unless_present = "list_endpoints",
        help_heading = "Domain Selection"
    )]
    pub name: Option<String>,

    /// TLDs to check (comma-separated or multiple -t flags)
    #[arg(short = 't', long = "tld", value_name = "TLD", value_delimiter = ',', action = clap::ArgAction::Append, help_heading = "Domain Selection")]
    pub tlds: Option<Vec<String>>,

    /// List the RDAP endpoint table and exit
    #[arg(long = "list-endpoints", help_heading = "Domain Selection")]
    pub list_endpoints: bool,

    /// Output results as JSON
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Group results into available and taken sections
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Show registrar, dates, status and nameservers for taken domains
    #[arg(short = 'i', long = "info", help_heading = "Output Format")]
    pub info: bool,

    /// Report failed lookups as unknown instead of available
    #[arg(long = "strict", help_heading = "Checking")]
    pub strict: bool,

    /// Max concurrent lookups (1-100)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Max concurrent lookups against one RDAP server
    #[arg(long = "per-endpoint", value_name = "N", help_heading = "Performance")]
    pub per_endpoint: Option<usize>,

    /// Pause after each lookup in milliseconds (0 disables pacing)
    #[arg(long = "pacing-ms", value_name = "MS", help_heading = "Performance")]
    pub pacing_ms: Option<u64>,

    /// Per-lookup timeout, e.g. 500ms, 5s, 1m
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Abort the whole batch after this long, e.g. 30s, 2m
    #[arg(long = "deadline", value_name = "DURATION", help_heading = "Performance")]
    pub deadline: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show detailed progress
    #[arg(short = 'v', long = "verbose", help_heading = "Debugging")]
    pub verbose: bool,

    /// Show lookup messages and debug logging
    #[arg(short = 'd', long = "debug", help_heading = "Debugging")]
    pub debug: bool,
}

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Text,
    Pretty,
    Json,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logger(args.verbose, args.debug);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    // --list-endpoints is self-contained, skip other validation
    if args.list_endpoints {
        return Ok(());
    }

    match args.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {}
        _ => return Err("You must specify a name to check".to_string()),
    }

    if args.json && args.pretty {
        return Err("--json and --pretty cannot be used together".to_string());
    }

    if let Some(concurrency) = args.concurrency {
        if !(1..=100).contains(&concurrency) {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    if let Some(limit) = args.per_endpoint {
        if !(1..=100).contains(&limit) {
            return Err("Per-endpoint concurrency must be between 1 and 100".to_string());
        }
    }

    if let Some(timeout) = &args.timeout {
        match parse_duration_string(timeout) {
            Some(duration) if !duration.is_zero() => {}
            Some(_) => return Err("Timeout must be greater than zero".to_string()),
            None => {
                return Err(format!(
                    "Invalid timeout '{}', use a format like '500ms', '5s', '1m'",
                    timeout
                ))
            }
        }
    }

    if let Some(deadline) = &args.deadline {
        match parse_duration_string(deadline) {
            Some(duration) if !duration.is_zero() => {}
            Some(_) => return Err("Deadline must be greater than zero".to_string()),
            None => {
                return Err(format!(
                    "Invalid deadline '{}', use a format like '30s', '2m'",
                    deadline
                ))
            }
        }
    }

    Ok(())
}

/// Install the stderr logger.
///
/// `RUST_LOG` wins when set. Otherwise only errors are shown, `-v` raises
/// both crates to info and `-d` to debug.
fn init_logger(verbose: bool, debug: bool) {
    let default_level = if debug {
        "tld_check=debug,tld_check_lib=debug"
    } else if verbose {
        "tld_check=info,tld_check_lib=info"
    } else {
        "error"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Main run loop
async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let config = build_config(&args, &env_config)?;

    if args.list_endpoints {
        print_endpoints(&config);
        return Ok(());
    }

    let mode = output_mode(&args, &env_config);
    let name = args.name.clone().unwrap_or_default();

    let request = CheckRequest::new(name, args.tlds.clone());
    let query = request.into_query(&config.default_tlds)?;
    let domain_count = query.tlds().len();
    let concurrency = config.concurrency;

    tracing::debug!(
        keyword = query.keyword(),
        tlds = domain_count,
        pacing = ?config.pacing,
        policy = %config.failure_policy,
        "starting check"
    );

    let show_info = config.detailed_info;
    let checker = DomainChecker::with_config(config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling remaining lookups");
            ctrl_c.cancel();
        }
    });

    if mode == OutputMode::Pretty {
        ui::print_header(query.keyword(), domain_count, concurrency);
    }

    let spinner = if mode != OutputMode::Json && Term::stderr().is_term() {
        Some(ui::Spinner::start(format!(
            "Checking {} domain{}...",
            domain_count,
            if domain_count == 1 { "" } else { "s" }
        )))
    } else {
        None
    };

    let start = Instant::now();
    let outcome = checker.check_query(&query, &cancel).await;

    if let Some(spinner) = spinner {
        spinner.stop().await;
    }

    let response = outcome?;
    display_response(&response, mode, show_info, args.debug)?;

    if mode != OutputMode::Json {
        ui::print_summary(&response, start.elapsed());
    }

    Ok(())
}

/// Build the effective configuration.
///
/// Precedence, lowest first: built-in defaults, config files (explicit
/// `--config`, then `TC_CONFIG`, otherwise discovery), environment, CLI.
fn build_config(args: &Args, env_config: &EnvConfig) -> Result<CheckConfig, Box<dyn std::error::Error>> {
    let manager = ConfigManager::new();

    let file_config: FileConfig = match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => manager.load_file(path)?,
        None => manager.discover_and_load()?,
    };

    let config = CheckConfig::default()
        .apply_file_config(&file_config)
        .apply_env_config(env_config);

    Ok(apply_cli_args(config, args))
}

/// Apply explicit command line flags on top of file and env configuration.
fn apply_cli_args(mut config: CheckConfig, args: &Args) -> CheckConfig {
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }

    if let Some(limit) = args.per_endpoint {
        config = config.with_per_endpoint_concurrency(limit);
    }

    if let Some(ms) = args.pacing_ms {
        config = config.with_pacing(PacingPolicy::from_millis(ms));
    }

    if let Some(timeout) = args.timeout.as_deref().and_then(parse_duration_string) {
        config = config.with_timeout(timeout);
    }

    if let Some(deadline) = args.deadline.as_deref().and_then(parse_duration_string) {
        config = config.with_batch_deadline(deadline);
    }

    if args.strict {
        config = config.with_failure_policy(FailurePolicy::ReportUnknown);
    }

    if args.info {
        config = config.with_detailed_info(true);
    }

    config
}

fn output_mode(args: &Args, env_config: &EnvConfig) -> OutputMode {
    if args.json {
        return OutputMode::Json;
    }
    if args.pretty {
        return OutputMode::Pretty;
    }
    match (env_config.json, env_config.pretty) {
        (Some(true), _) => OutputMode::Json,
        (_, Some(true)) => OutputMode::Pretty,
        _ => OutputMode::Text,
    }
}

fn display_response(
    response: &DomainCheckResponse,
    mode: OutputMode,
    show_info: bool,
    debug: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(response)?);
        }
        OutputMode::Pretty => ui::print_grouped_results(&response.results, show_info, debug),
        OutputMode::Text => {
            for result in &response.results {
                ui::print_result(result, show_info, debug);
            }
        }
    }
    Ok(())
}

/// Print the TLD to RDAP endpoint table, including config overrides.
fn print_endpoints(config: &CheckConfig) {
    let resolver = EndpointResolver::with_overrides(&config.endpoint_overrides);

    println!("RDAP endpoints:\n");
    for (tld, template) in resolver.known_tlds() {
        println!("  {:<8} {}", tld, template);
    }
    println!("  {:<8} {}", "*", resolver.fallback_template());
    println!();
    println!("Default TLDs: {}", config.default_tlds.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["tld-check"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_name_required_without_list_endpoints() {
        assert!(Args::try_parse_from(["tld-check"]).is_err());
        assert!(Args::try_parse_from(["tld-check", "--list-endpoints"]).is_ok());
    }

    #[test]
    fn test_tld_flag_accepts_commas_and_repeats() {
        let args = parse(&["example", "-t", "com,net", "-t", "org"]);
        assert_eq!(
            args.tlds,
            Some(vec!["com".to_string(), "net".to_string(), "org".to_string()])
        );
    }

    #[test]
    fn test_validate_args_accepts_plain_name() {
        assert!(validate_args(&parse(&["example"])).is_ok());
        assert!(validate_args(&parse(&["example.com", "--timeout", "3s"])).is_ok());
    }

    #[test]
    fn test_validate_args_rejects_conflicting_output() {
        let err = validate_args(&parse(&["example", "--json", "--pretty"])).unwrap_err();
        assert!(err.contains("cannot be used together"));
    }

    #[test]
    fn test_validate_args_rejects_bad_numbers() {
        assert!(validate_args(&parse(&["example", "-c", "0"])).is_err());
        assert!(validate_args(&parse(&["example", "-c", "101"])).is_err());
        assert!(validate_args(&parse(&["example", "--per-endpoint", "0"])).is_err());
    }

    #[test]
    fn test_validate_args_rejects_bad_durations() {
        assert!(validate_args(&parse(&["example", "--timeout", "soon"])).is_err());
        assert!(validate_args(&parse(&["example", "--timeout", "0s"])).is_err());
        assert!(validate_args(&parse(&["example", "--deadline", "later"])).is_err());
        assert!(validate_args(&parse(&["example", "--deadline", "0ms"])).is_err());
        assert!(validate_args(&parse(&["example", "--timeout", "400000000000000000m"])).is_err());
    }

    #[test]
    fn test_validate_args_rejects_blank_name() {
        let err = validate_args(&parse(&["  "])).unwrap_err();
        assert!(err.contains("name"));
    }

    #[test]
    fn test_cli_args_override_config() {
        let args = parse(&[
            "example",
            "-c",
            "5",
            "--pacing-ms",
            "0",
            "--timeout",
            "2s",
            "--deadline",
            "1m",
            "--strict",
            "--info",
        ]);

        let config = apply_cli_args(CheckConfig::default().with_concurrency(50), &args);

        assert_eq!(config.concurrency, 5);
        assert_eq!(config.pacing, PacingPolicy::None);
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.batch_deadline, Some(Duration::from_secs(60)));
        assert_eq!(config.failure_policy, FailurePolicy::ReportUnknown);
        assert!(config.detailed_info);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let base = CheckConfig::default().with_concurrency(7);
        let config = apply_cli_args(base.clone(), &parse(&["example"]));

        assert_eq!(config.concurrency, 7);
        assert_eq!(config.pacing, base.pacing);
        assert_eq!(config.failure_policy, FailurePolicy::TreatAsAvailable);
        assert!(!config.detailed_info);
    }

    #[test]
    fn test_output_mode_precedence() {
        let env_json = EnvConfig {
            json: Some(true),
            ..Default::default()
        };

        assert_eq!(
            output_mode(&parse(&["example"]), &EnvConfig::default()),
            OutputMode::Text
        );
        assert_eq!(output_mode(&parse(&["example"]), &env_json), OutputMode::Json);
        assert_eq!(
            output_mode(&parse(&["example", "--pretty"]), &env_json),
            OutputMode::Pretty
        );
    }
}
