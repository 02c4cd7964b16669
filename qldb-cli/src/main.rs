//! qldb - A CodeQL database manager
//!
//! Download, deploy and create CodeQL databases with ease.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing_subscriber::EnvFilter;

use qldb_core::catalog::{self, EntryInfo, InstallOutcome};
use qldb_core::codeql::CodeqlCli;
use qldb_core::{layout, GitHubClient, Installer, ListFilter, RepoId};

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "qldb",
    about = "A CodeQL database manager. Download, deploy and create CodeQL databases with ease.",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "info", global = true)]
    log_level: LogLevel,
}

#[derive(Parser, Debug)]
enum Command {
    /// Extract a CodeQL database from a source path and install it
    ///
    /// Pass the CodeQL arguments after a '--' separator, e.g.:
    /// qldb create --nwo foo/bar -- --source-root /path/to/src --language javascript
    Create {
        /// The NWO (owner/repo) of the repository to create the database for
        #[clap(long, short = 'n')]
        nwo: String,

        /// Arguments forwarded to `codeql database create`
        #[clap(last = true)]
        codeql_args: Vec<String>,
    },

    /// Download CodeQL databases from GitHub code scanning
    Download {
        /// The NWO (owner/repo) of the repository to download databases for
        #[clap(long, short = 'n')]
        nwo: String,

        /// The primary language to download, or 'all' for every language
        #[clap(long, short = 'l')]
        language: String,
    },

    /// Install a local CodeQL database into the catalog
    Install {
        /// The NWO (owner/repo) to associate the database with
        #[clap(long, short = 'n')]
        nwo: String,

        /// Path to the database: an unpacked directory or a .zip archive
        #[clap(long, short = 'd')]
        database: PathBuf,

        /// Remove the source database after installing it
        #[clap(long, short = 'r')]
        remove: bool,
    },

    /// List the CodeQL databases stored in the catalog
    List {
        /// Only show entries whose path contains this NWO (case-insensitive)
        #[clap(long, short = 'n')]
        nwo: Option<String>,

        /// Only show databases for this primary language
        #[clap(long, short = 'l')]
        language: Option<String>,

        /// Use JSON as the output format
        #[clap(long, short = 'j')]
        json: bool,
    },

    /// Show commit information for databases stored in the catalog
    Info {
        /// The NWO (owner/repo) of the repository to inspect
        #[clap(
            long,
            short = 'n',
            conflicts_with = "db_path",
            required_unless_present = "db_path"
        )]
        nwo: Option<String>,

        /// Path to a single database to inspect instead of a repository
        #[clap(long, short = 'p')]
        db_path: Option<PathBuf>,

        /// Only show databases for this primary language
        #[clap(long, short = 'l')]
        language: Option<String>,

        /// Use JSON as the output format
        #[clap(long, short = 'j')]
        json: bool,
    },
}

/// Configure logging from the global --log-level flag. Logs go to stderr so
/// stdout stays machine-parsable.
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);
    tracing::debug!("Parsed command: {:?}", cli.command);

    match cli.command {
        Command::Create { nwo, codeql_args } => create_command(&nwo, codeql_args).await,
        Command::Download { nwo, language } => download_command(&nwo, &language).await,
        Command::Install {
            nwo,
            database,
            remove,
        } => install_command(&nwo, &database, remove).await,
        Command::List {
            nwo,
            language,
            json,
        } => list_command(nwo, language, json),
        Command::Info {
            nwo,
            db_path,
            language,
            json,
        } => info_command(nwo, db_path, language.as_deref(), json).await,
    }
}

async fn create_command(nwo: &str, codeql_args: Vec<String>) -> Result<()> {
    let repo = RepoId::parse(nwo)?;
    println!("Creating database for '{repo}' (codeql args: {codeql_args:?})");

    let codeql = CodeqlCli::new();
    let installer = Installer::new()?;
    let outcome = installer.create(&codeql, &repo, &codeql_args)?;

    report_outcome(&outcome);
    Ok(())
}

async fn download_command(nwo: &str, language: &str) -> Result<()> {
    let repo = RepoId::parse(nwo)?;
    let client = GitHubClient::new()?;

    println!("Fetching database listing for '{repo}'");
    let databases = client.list_databases(&repo).await?;
    if databases.is_empty() {
        println!("No code-scanning databases available for '{repo}'");
        return Ok(());
    }

    let languages: Vec<&str> = databases.iter().map(|db| db.language.as_str()).collect();
    println!(
        "Found databases for the following languages: {}",
        languages.join(", ")
    );

    let installer = Installer::new()?;
    let outcomes = installer
        .download(&client, &repo, &databases, language)
        .await?;

    for outcome in &outcomes {
        report_outcome(outcome);
    }
    println!("\nDone");
    Ok(())
}

async fn install_command(nwo: &str, database: &Path, remove: bool) -> Result<()> {
    let repo = RepoId::parse(nwo)?;
    println!("Installing '{}' database for '{repo}'", database.display());

    let installer = Installer::new()?;
    let outcome = installer.install(&repo, database, remove)?;

    report_outcome(&outcome);
    Ok(())
}

fn list_command(nwo: Option<String>, language: Option<String>, json: bool) -> Result<()> {
    let filter = ListFilter { nwo, language };
    let entries = catalog::list_entries(&layout::catalog_root()?, &filter)?;

    if json {
        let paths: Vec<String> = entries
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        println!("{}", serde_json::to_string_pretty(&paths)?);
    } else {
        for entry in &entries {
            println!("{}", entry.display());
        }
    }
    Ok(())
}

/// Table row for resolved catalog entries
#[derive(Tabled)]
struct InfoRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Language")]
    language: String,
    #[tabled(rename = "Commit")]
    commit: String,
    #[tabled(rename = "Committed")]
    committed: String,
}

async fn info_command(
    nwo: Option<String>,
    db_path: Option<PathBuf>,
    language: Option<&str>,
    json: bool,
) -> Result<()> {
    let client = GitHubClient::new()?;

    let results: Vec<EntryInfo> = if let Some(nwo) = nwo {
        let repo = RepoId::parse(&nwo)?;
        catalog::repo_info(&client, &layout::catalog_root()?, &repo, language).await?
    } else if let Some(path) = db_path {
        vec![catalog::entry_info(&client, &path).await?]
    } else {
        anyhow::bail!("either --nwo or --db-path is required");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No databases found.");
        return Ok(());
    }

    let rows: Vec<InfoRow> = results
        .iter()
        .map(|info| InfoRow {
            path: info.path.display().to_string(),
            language: info.language.clone(),
            commit: layout::short_sha(&info.commit_sha).to_string(),
            committed: info
                .committed_date
                .split('T')
                .next()
                .unwrap_or(&info.committed_date)
                .to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{table}");
    Ok(())
}

fn report_outcome(outcome: &InstallOutcome) {
    println!();
    println!("Commit SHA:       {}", outcome.commit_sha);
    println!("Short commit SHA: {}", outcome.short_sha);
    println!("Primary language: {}", outcome.language);

    if outcome.freshly_installed {
        println!("Installed database to '{}'", outcome.archive_path.display());
    } else {
        println!(
            "Database already installed for the same commit at '{}'",
            outcome.archive_path.display()
        );
    }
}
