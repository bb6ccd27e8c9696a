use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use gqlprobe::auth::{AuthOutcome, AuthReason, Credential};
use gqlprobe::config::{ScanConfig, DEFAULT_OUTPUT};
use gqlprobe::discovery::{CandidateSource, DEFAULT_CONCURRENCY};
use gqlprobe::scan::{self, Introspection, Reporter, Resolution, RunReport};
use gqlprobe::schema::MutationFinding;
use gqlprobe::ProbeError;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_banner() {
    println!("{}", "                 __                 __        ".bright_magenta());
    println!("{}", "   ____ _ ____ _/ /___  _________  / /_  ___  ".bright_magenta());
    println!("{}", "  / __ `// __ `/ / __ \\/ ___/ __ \\/ __ \\/ _ \\ ".bright_magenta());
    println!("{}", " / /_/ // /_/ / / /_/ / /  / /_/ / /_/ /  __/ ".bright_magenta());
    println!("{}", " \\__, / \\__, /_/ .___/_/   \\____/_.___/\\___/  ".bright_magenta());
    println!("{}", "/____/     /_/ /_/                            ".bright_magenta());
    println!(
        "  {} {}\n",
        "GraphQL Endpoint & Introspection Probe".bold().white(),
        format!("v{}", VERSION).dimmed()
    );
}

#[derive(Parser)]
#[command(name = "gqlprobe")]
#[command(version = VERSION)]
#[command(about = "find a graphql endpoint, check introspection, dump the schema and flag risky mutations")]
struct Cli {
    /// Target URL (a GraphQL endpoint or the base to search under)
    #[arg(short, long)]
    url: String,

    /// Schema dump file path
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Bearer token (takes precedence over --cookies)
    #[arg(short, long)]
    token: Option<String>,

    /// Session cookies, e.g. "session=abc; csrf=xyz"
    #[arg(short, long)]
    cookies: Option<String>,

    /// Custom wordlist of candidate endpoint paths
    #[arg(short, long)]
    wordlist: Option<PathBuf>,

    /// Number of candidate paths probed in parallel
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Per-probe timeout in seconds
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    probe_timeout: u64,

    /// Treat the URL as the endpoint and skip discovery
    #[arg(long)]
    skip_discovery: bool,

    /// Custom HTTP headers (can be repeated)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// HTTP/HTTPS/SOCKS proxy URL
    #[arg(short = 'x', long)]
    proxy: Option<String>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn parse_headers(headers: &[String]) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();

    for header in headers {
        // Try JSON format first: {"X-Api-Key": "secret"}
        if header.starts_with('{') {
            let parsed: HashMap<String, String> =
                serde_json::from_str(header).context("Invalid JSON header format")?;
            map.extend(parsed);
        } else if let Some((key, value)) = header.split_once(':') {
            // Standard format: "X-Api-Key: secret"
            map.insert(key.trim().to_string(), value.trim().to_string());
        } else {
            bail!("Invalid header format: {}", header);
        }
    }

    Ok(map)
}

fn build_config(cli: &Cli) -> Result<ScanConfig> {
    let mut config = ScanConfig::new(cli.url.clone());
    config.output = cli.output.clone();
    config.credential = Credential::build(cli.token.as_deref(), cli.cookies.as_deref());
    config.candidates = CandidateSource::from_wordlist(cli.wordlist.clone());
    config.concurrency = cli.concurrency;
    config.probe_timeout = Duration::from_secs(cli.probe_timeout);
    config.skip_discovery = cli.skip_discovery;
    config.headers = parse_headers(&cli.headers)?;
    config.proxy = cli.proxy.clone();
    Ok(config)
}

fn init_logging(verbose: u8, ansi: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "gqlprobe=debug",
        _ => "gqlprobe=trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .init();
}

/// Renders run progress on the console.
struct ConsoleReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn stop_spinner(&self) {
        if let Ok(mut guard) = self.spinner.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl Reporter for ConsoleReporter {
    fn credential_configured(&self, credential: &Credential) {
        match credential {
            Credential::None => {}
            Credential::Bearer(_) => {
                println!("{} Using Bearer Token authentication", "[*]".cyan())
            }
            Credential::Cookies(cookies) => println!(
                "{} Using Session Cookie authentication ({} cookie(s))",
                "[*]".cyan(),
                cookies.len()
            ),
        }
    }

    fn discovery_started(&self, base_url: &str, candidates: usize) {
        println!(
            "{} Target is not a GraphQL endpoint, fuzzing {} path(s) under {}",
            "[*]".cyan(),
            candidates,
            base_url
        );

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("    {spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("probing candidates");
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut guard) = self.spinner.lock() {
            *guard = Some(bar);
        }
    }

    fn discovery_finished(&self, resolved: Option<&str>) {
        self.stop_spinner();
        if resolved.is_none() {
            println!("{} No common GraphQL endpoints discovered", "[-]".red());
        }
    }

    fn endpoint_resolved(&self, url: &str, how: Resolution) {
        match how {
            Resolution::Assumed => println!("{} Using endpoint: {}", "[*]".cyan(), url),
            Resolution::Direct => println!("{} GraphQL endpoint confirmed: {}", "[+]".green(), url),
            Resolution::Discovered => {
                println!("{} Found valid endpoint: {}", "[+]".green(), url.bold())
            }
        }
    }

    fn auth_validated(&self, outcome: &AuthOutcome) {
        if !outcome.tested {
            return;
        }
        println!("{} Validating authentication credentials...", "[*]".yellow());
        print_auth_outcome(outcome);
    }

    fn introspection_started(&self, url: &str) {
        println!("{} Checking introspection on {}...", "[*]".cyan(), url);
    }
}

fn print_auth_outcome(outcome: &AuthOutcome) {
    let line = match outcome.reason {
        AuthReason::Ok => format!("[✓] {}", outcome.detail).green(),
        AuthReason::Forbidden => format!("[!] {}", outcome.detail).yellow(),
        _ => format!("[✗] {}", outcome.detail).red(),
    };
    println!("{}", line);
}

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Mutation")]
    name: String,
    #[tabled(rename = "Sensitive")]
    sensitive: String,
}

fn findings_table(findings: &[MutationFinding]) -> String {
    let rows: Vec<FindingRow> = findings
        .iter()
        .enumerate()
        .map(|(i, f)| FindingRow {
            index: i + 1,
            name: f.name.clone(),
            sensitive: if f.sensitive { "YES".to_string() } else { "-".to_string() },
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

fn print_report(report: &RunReport) {
    println!();
    match &report.introspection {
        Introspection::Disabled => {
            println!(
                "{} Introspection is disabled or the endpoint is protected",
                "[-]".red()
            );
            return;
        }
        Introspection::Enabled { schema_file, types } => {
            println!("{} Introspection is ENABLED!", "[!]".yellow().bold());
            println!(
                "{} Schema dumped successfully to {} ({} types)",
                "[+]".green(),
                schema_file.display(),
                types
            );
        }
    }

    if report.mutations.is_empty() {
        println!("{} Schema exposes no mutations", "[*]".cyan());
        return;
    }

    let sensitive = report.sensitive_mutations().count();
    println!(
        "\n{} {} mutation(s), {} flagged as sensitive:\n",
        "[*]".cyan(),
        report.mutations.len(),
        sensitive
    );
    println!("{}", findings_table(&report.mutations));

    for finding in report.sensitive_mutations() {
        println!("    {} {}", "[!]".red().bold(), finding.name.bold());
    }
}

fn print_failure(err: &ProbeError) {
    let message = match err {
        ProbeError::NotFound => "Endpoint discovery failed: no GraphQL endpoint answered".to_string(),
        ProbeError::AuthDenied { stage, status } => format!(
            "Authentication rejected with HTTP {} during {}",
            status, stage
        ),
        ProbeError::Parse(e) => format!("Schema dump returned malformed JSON: {}", e),
        other => other.to_string(),
    };
    eprintln!("{} {}", "[✗]".red().bold(), message.red());
}

async fn run(cli: Cli) -> Result<i32> {
    let config = build_config(&cli)?;

    let report = if cli.json {
        scan::run(&config, &scan::SilentReporter).await
    } else {
        print_banner();
        println!("{} Targeting: {}\n", "[*]".cyan(), config.target);
        scan::run(&config, &ConsoleReporter::new()).await
    };

    match report {
        Ok(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(0)
        }
        Err(e) => {
            print_failure(&e);
            Ok(e.exit_code())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_logging(cli.verbose, !cli.no_color);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "[✗]".red().bold(), e);
            1
        }
    };

    std::process::exit(code);
}
