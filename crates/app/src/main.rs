use std::fmt;
use std::path::{Path, PathBuf};

use services::{
    AppServices, Clock, SessionSnapshot, StoreBackend, WorksheetSession, measurement_table,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingCommand,
    MissingValue { flag: &'static str },
    MissingSession,
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "expected a subcommand: summary or submit"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingSession => write!(f, "--session <file> is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid SQLite url: {raw}"),
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
    eprintln!("  cargo run -p app -- summary --session <snapshot.json>");
    eprintln!("  cargo run -p app -- submit  --session <snapshot.json> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("submit appends to the remote sheet when PIPETTE_SHEETS_TOKEN and");
    eprintln!("PIPETTE_SPREADSHEET_ID are set, otherwise to SQLite.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PIPETTE_SHEETS_TOKEN, PIPETTE_SPREADSHEET_ID, PIPETTE_SHEETS_BASE_URL,");
    eprintln!("  PIPETTE_SHEET_NAME, PIPETTE_DB_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Summary,
    Submit,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "summary" => Some(Self::Summary),
            "submit" => Some(Self::Submit),
            _ => None,
        }
    }
}

struct Args {
    session: PathBuf,
    db_url: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut session = None;
        let mut db_url = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--session" => {
                    session = Some(PathBuf::from(require_value(args, "--session")?));
                }
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(normalize_sqlite_url(value));
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            session: session.ok_or(ArgsError::MissingSession)?,
            db_url,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// `sqlx` refuses to open a missing file, so create it (and its directory) first.
fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
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

    let path = Path::new(path);
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

/// `--db` wins over the environment; any SQLite url is normalized.
fn resolve_backend(db_flag: Option<String>, from_env: StoreBackend) -> StoreBackend {
    match (db_flag, from_env) {
        (Some(url), backend) => StoreBackend::Sqlite {
            url,
            sheet_name: backend.sheet_name().to_string(),
        },
        (None, StoreBackend::Sqlite { url, sheet_name }) => StoreBackend::Sqlite {
            url: normalize_sqlite_url(url),
            sheet_name,
        },
        (None, backend) => backend,
    }
}

fn load_session(path: &Path) -> Result<SessionSnapshot, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(SessionSnapshot::from_json(&json)?)
}

fn fmt_grams(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

fn print_summary(session: &WorksheetSession) {
    let learner = session
        .learner()
        .map_or("(unnamed)", |learner| learner.name.as_str());
    println!(
        "{learner} | {:?} worksheet | {:?}",
        session.variant(),
        session.state()
    );
    println!();
    println!(
        "{:<28} {:>8} {:>10} {:>10} {:>10}  Readings (g)",
        "Row", "Target", "Mean (g)", "Std (g)", "Error (g)"
    );
    for row in measurement_table(session) {
        let readings = row.entries.as_ref().map_or_else(
            || "not started".to_string(),
            |entries| {
                entries
                    .iter()
                    .map(|v| format!("{v:.3}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        );
        println!(
            "{:<28} {:>6}µL {:>10} {:>10} {:>10}  {readings}",
            row.label(),
            row.target_volume_ul,
            fmt_grams(row.mean_g),
            fmt_grams(row.std_dev_g),
            fmt_grams(row.accuracy_error_g),
        );
        if !row.notes.trim().is_empty() {
            println!("{:<28} notes: {}", "", row.notes);
        }
    }

    let progress = session.progress();
    println!();
    println!(
        "Questions answered: {}/{}  Rows started: {}/{}",
        progress.questions_answered,
        progress.questions_total,
        progress.rows_opened,
        progress.rows_total
    );
    if !progress.missing.is_empty() {
        let missing = progress
            .missing
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!("Still missing: {missing}");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Err(ArgsError::MissingCommand.into());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    tracing::debug!(?cmd, session = %parsed.session.display(), "loading snapshot");
    let snapshot = load_session(&parsed.session)?;

    match cmd {
        Command::Summary => {
            let session = snapshot.restore()?;
            print_summary(&session);
            Ok(())
        }
        Command::Submit => {
            let backend = resolve_backend(parsed.db_url, StoreBackend::from_env());
            if let StoreBackend::Sqlite { url, .. } = &backend {
                prepare_sqlite_file(url)?;
            }

            let services = AppServices::new(backend, Clock::system()).await?;
            let worksheets = services.worksheets();
            let mut session = worksheets.restore(snapshot)?;
            worksheets.submit(&mut session).await?;
            println!(
                "submitted {} to {}",
                session.id(),
                worksheets.submitter().sheet_name()
            );
            Ok(())
        }
    }
}

fn log_filter() -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();
    for default in ["app=info", "services=info", "storage=info"] {
        if let Ok(directive) = default.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
