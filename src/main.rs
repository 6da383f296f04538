//! keyferry - batch key migration for Redis-compatible stores
//!
//! Exports manifest-listed keys into a portable data file and replays
//! such files into any reachable store or database.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use keyferry::{Config, Ferry, RedisStore};

/// keyferry - move keys between Redis-compatible stores
#[derive(Parser, Debug)]
#[command(name = "keyferry")]
#[command(author, version, about = "Move keys between Redis-compatible stores")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Store host to connect to
    #[arg(long, global = true, env = "KEYFERRY_HOST")]
    host: Option<String>,

    /// Store port
    #[arg(short, long, global = true, env = "KEYFERRY_PORT")]
    port: Option<u16>,

    /// Logical database to operate on
    #[arg(long, global = true, env = "KEYFERRY_DATABASE")]
    database: Option<u32>,

    /// Password for the connection
    #[arg(long, global = true, env = "KEYFERRY_AUTH")]
    auth: Option<String>,

    /// Manifest file listing the keys to process
    #[arg(short, long, global = true, env = "KEYFERRY_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Interchange data file to write or replay
    #[arg(short, long, global = true, env = "KEYFERRY_DATA")]
    data: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, global = true, env = "KEYFERRY_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export manifest keys from the store into the data file
    Export,

    /// Replay the data file into the store
    Import,

    /// Export from the configured database, then replay into another
    Sync {
        /// Database to replay the exported file into
        #[arg(long)]
        target_db: u32,
    },

    /// Write a starter configuration file
    Init {
        /// Where to write the file
        #[arg(short, long, default_value = "keyferry.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Command-line flags and environment variables win over the
    /// configuration file.
    fn apply_to_config(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.store.host = host.clone();
        }
        if let Some(port) = self.port {
            config.store.port = port;
        }
        if let Some(database) = self.database {
            config.store.database = database;
        }
        if let Some(auth) = &self.auth {
            config.store.auth = Some(auth.clone());
        }
        if let Some(manifest) = &self.manifest {
            config.files.manifest = manifest.clone();
        }
        if let Some(data) = &self.data {
            config.files.data = data.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;
    cli.apply_to_config(&mut config);

    // Init never touches the store, so it skips validation and
    // connection setup.
    if let Commands::Init { ref output, force } = cli.command {
        return cmd_init(output, force);
    }

    config.validate()?;
    init_logging(&config);

    let store = RedisStore::from_config(&config.store).await?;
    let mut ferry = Ferry::new(
        store,
        config.files.manifest.clone(),
        config.files.data.clone(),
    );

    match cli.command {
        Commands::Export => cmd_export(&mut ferry, &config).await,
        Commands::Import => cmd_import(&mut ferry, &config).await,
        Commands::Sync { target_db } => cmd_sync(&mut ferry, &config, target_db).await,
        Commands::Init { .. } => Ok(()),
    }
}

// ── Config ───────────────────────────────────────────────────────────

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    if let Some(path) = &cli.config {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Ok(Config::from_file(path)?);
    }

    let default_path = PathBuf::from("keyferry.toml");
    if default_path.exists() {
        return Ok(Config::from_file(&default_path)?);
    }

    Ok(Config::default())
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn location(config: &Config) -> String {
    format!(
        "{}:{}/{}",
        config.store.host, config.store.port, config.store.database
    )
}

// ── Export ───────────────────────────────────────────────────────────

async fn cmd_export(ferry: &mut Ferry<RedisStore>, config: &Config) -> anyhow::Result<()> {
    println!(
        "{} Exporting keys from {} into {}...",
        "→".cyan().bold(),
        location(config).yellow(),
        config.files.data.display().to_string().yellow()
    );
    println!();

    let summary = ferry.export().await?;

    println!("{}", "✓ Export finished".green().bold());
    println!("  Records written: {}", summary.records_written);
    if summary.entries_skipped > 0 {
        println!(
            "  {}",
            format!("Entries skipped: {}", summary.entries_skipped).yellow()
        );
    }
    Ok(())
}

// ── Import ───────────────────────────────────────────────────────────

async fn cmd_import(ferry: &mut Ferry<RedisStore>, config: &Config) -> anyhow::Result<()> {
    println!(
        "{} Importing {} into {}...",
        "→".cyan().bold(),
        config.files.data.display().to_string().yellow(),
        location(config).yellow()
    );
    println!();

    let summary = ferry.import().await?;

    println!("{}", "✓ Import finished".green().bold());
    println!("  Records applied: {}", summary.records_applied);
    if summary.records_skipped > 0 {
        println!(
            "  {}",
            format!("Records skipped: {}", summary.records_skipped).yellow()
        );
    }
    Ok(())
}

// ── Sync ─────────────────────────────────────────────────────────────

async fn cmd_sync(
    ferry: &mut Ferry<RedisStore>,
    config: &Config,
    target_db: u32,
) -> anyhow::Result<()> {
    println!(
        "{} Syncing database {} to {} on {}...",
        "→".cyan().bold(),
        config.store.database.to_string().yellow(),
        target_db.to_string().yellow(),
        location(config).yellow()
    );
    println!();

    let (exported, imported) = ferry.sync(target_db).await?;

    println!("{}", "✓ Sync finished".green().bold());
    println!("  Records exported: {}", exported.records_written);
    println!("  Records applied:  {}", imported.records_applied);
    let skipped = exported.entries_skipped + imported.records_skipped;
    if skipped > 0 {
        println!("  {}", format!("Records skipped:  {}", skipped).yellow());
    }
    Ok(())
}

// ── Init ─────────────────────────────────────────────────────────────

fn cmd_init(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    std::fs::write(output, STARTER_CONFIG)?;

    println!(
        "{} Wrote {}",
        "✓".green().bold(),
        output.display().to_string().yellow()
    );
    println!();
    println!("Next steps:");
    println!("  1. Point the [store] section at your server");
    println!("  2. List the keys to migrate in {}", "keys.csv".yellow());
    println!("  3. Run {}", "keyferry export".cyan());
    Ok(())
}

const STARTER_CONFIG: &str = r#"# keyferry configuration

[store]
host = "127.0.0.1"
port = 6379
database = 0
# auth = "password"

[files]
manifest = "keys.csv"
data = "keys.dat"

[logging]
level = "info"
"#;
