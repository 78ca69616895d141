use std::fmt;
use std::io;
use std::time::Duration;

use lingo_core::OutcomePolicy;
use services::{AppConfig, AppServices, Clock};

mod telemetry;
mod terminal;

use terminal::Terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidOutcomePolicy { raw: String },
    InvalidAuthTimeout { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidOutcomePolicy { raw } => {
                write!(f, "invalid --outcome-policy value: {raw}")
            }
            ArgsError::InvalidAuthTimeout { raw } => {
                write!(f, "invalid --auth-timeout-secs value: {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [play]   [options]   # interactive lessons");
    eprintln!("  cargo run -p app -- overview [options]   # print the home screen as JSON");
    eprintln!("  cargo run -p app -- reset    [options]   # drop progress and preferences");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>                         (default sqlite://devlingo.sqlite3)");
    eprintln!("  --outcome-policy reach-the-end|perfect-run (default reach-the-end)");
    eprintln!("  --auth-timeout-secs <n>                   (default 10)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LINGO_DB_URL, LINGO_OUTCOME_POLICY, LINGO_AUTH_TIMEOUT_SECS, LOG_LEVEL, LOG_FORMAT");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Overview,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "overview" => Some(Self::Overview),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    config: AppConfig,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("LINGO_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://devlingo.sqlite3".into(), normalize_sqlite_url);
        let mut config = AppConfig::default();
        if let Ok(raw) = std::env::var("LINGO_OUTCOME_POLICY") {
            config.outcome_policy = parse_policy(raw)?;
        }
        if let Ok(raw) = std::env::var("LINGO_AUTH_TIMEOUT_SECS") {
            config.auth_timeout = parse_timeout(raw)?;
        }

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--outcome-policy" => {
                    config.outcome_policy = parse_policy(require_value(args, "--outcome-policy")?)?;
                }
                "--auth-timeout-secs" => {
                    config.auth_timeout =
                        parse_timeout(require_value(args, "--auth-timeout-secs")?)?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, config })
    }
}

fn parse_policy(raw: String) -> Result<OutcomePolicy, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidOutcomePolicy { raw })
}

fn parse_timeout(raw: String) -> Result<Duration, ArgsError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ArgsError::InvalidAuthTimeout { raw }),
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.starts_with("sqlite:file:") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system(), parsed.config).await?;
    tracing::info!(
        db_url = %parsed.db_url,
        outcome_policy = %parsed.config.outcome_policy,
        command = ?cmd,
        "devlingo starting"
    );

    match cmd {
        Command::Play => {
            let mut terminal = Terminal::new(services, io::stdin().lock(), io::stdout());
            terminal.run().await
        }
        Command::Overview => {
            let overview = services.overview().overview().await?;
            println!("{}", serde_json::to_string_pretty(&overview)?);
            Ok(())
        }
        Command::Reset => {
            services.progress().reset().await?;
            services.preferences().clear().await?;
            eprintln!("progress and preferences cleared ({})", parsed.db_url);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
