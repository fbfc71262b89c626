//! Command-line entry point for the prospects core.
//!
//! # Responsibility
//! - Render identity codes to PNG files.
//! - Feed scanned payloads into a database and list its contacts.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use prospects_core::db::open_shared;
use prospects_core::{
    init_logging, AuthorizationStatus, ContactFilter, CoreConfig, InProcessNotificationCenter,
    PromptAnswer, ProspectsService, ScanOutcome, SortSpec, SqliteContactRepository,
    SqliteSettingsRepository,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "prospects", version, about = "Prospects contact tracker")]
struct Cli {
    /// JSON config file; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core ping and version.
    Ping,
    /// Write the identity code for NAME/EMAIL as PNG.
    Code {
        name: String,
        email: String,
        out: PathBuf,
    },
    /// Insert a contact from a scanned payload (`name` newline `email`).
    Scan {
        db: PathBuf,
        /// Payload text, taken verbatim.
        payload: String,
        /// Treat a literal `\n` as the name/email separator.
        #[arg(long)]
        escaped: bool,
    },
    /// List contacts.
    List {
        db: PathBuf,
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,
    },
    /// Flip a contact's contacted flag.
    Toggle { db: PathBuf, id: uuid::Uuid },
    /// Delete a contact.
    Delete { db: PathBuf, id: uuid::Uuid },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Contacted,
    Uncontacted,
}

impl From<FilterArg> for ContactFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => Self::All,
            FilterArg::Contacted => Self::ContactedOnly,
            FilterArg::Uncontacted => Self::UncontactedOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Date,
}

impl SortArg {
    fn spec(self) -> SortSpec {
        match self {
            Self::Name => SortSpec::by_name(),
            Self::Date => SortSpec::by_date(),
        }
    }
}

type CliService = ProspectsService<SqliteContactRepository, SqliteSettingsRepository>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CoreConfig::load(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => CoreConfig::default(),
    };

    if let Some(log_dir) = &cli.log_dir {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| anyhow!("log dir must be valid UTF-8"))?;
        init_logging(config.log_level(), log_dir).map_err(|err| anyhow!(err))?;
    }

    match cli.command {
        Command::Ping => {
            println!("prospects_core ping={}", prospects_core::ping());
            println!("prospects_core version={}", prospects_core::core_version());
        }
        Command::Code { name, email, out } => {
            let image = config.codec()?.encode(&name, &email);
            if image.is_placeholder() {
                eprintln!("warning: payload too large; writing placeholder image");
            }
            std::fs::write(&out, image.to_png()?)
                .with_context(|| format!("failed to write `{}`", out.display()))?;
            println!("{}x{} {}", image.width(), image.height(), out.display());
        }
        Command::Scan {
            db,
            payload,
            escaped,
        } => {
            let service = open_service(&db, &config)?;
            let payload = scan_payload(payload, escaped);
            let contact = service
                .handle_scan(ScanOutcome::Success(payload))
                .ok_or_else(|| anyhow!("scan discarded: payload is not a name/email pair"))?;
            println!("{}", contact.id);
        }
        Command::List { db, filter, sort } => {
            let service = open_service(&db, &config)?;
            let filter = ContactFilter::from(filter);
            let snapshot = service.list(filter, &sort.spec())?;
            println!("# {} ({})", filter.title(), snapshot.len());
            for contact in snapshot.contacts() {
                let mark = if contact.is_contacted { "x" } else { " " };
                println!("[{mark}] {} {} <{}>", contact.id, contact.name, contact.email);
            }
        }
        Command::Toggle { db, id } => {
            let contact = open_service(&db, &config)?.toggle_contacted(id)?;
            println!("{} contacted={}", contact.id, contact.is_contacted);
        }
        Command::Delete { db, id } => {
            let removed = open_service(&db, &config)?.delete(id)?;
            println!("{id} removed={removed}");
        }
    }
    Ok(())
}

/// Expands the first literal `\n` only; later ones stay part of the email.
fn scan_payload(raw: String, escaped: bool) -> String {
    if escaped {
        raw.replacen("\\n", "\n", 1)
    } else {
        raw
    }
}

fn open_service(db: &Path, config: &CoreConfig) -> Result<CliService> {
    let conn = open_shared(db).with_context(|| format!("failed to open `{}`", db.display()))?;
    // Reminders are not offered from the command line.
    let (center, _fired) =
        InProcessNotificationCenter::new(AuthorizationStatus::Denied, PromptAnswer::Deny);
    Ok(ProspectsService::open(conn, config, Arc::new(center))?)
}
