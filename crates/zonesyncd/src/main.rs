// # zonesyncd - zonesync runner
//
// Thin integration layer: all reconciliation logic lives in zonesync-core.
//
// The binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering providers
// 4. Running exactly one reconciliation pass
//
// ## Commands
//
// - `zonesyncd records`: print the current endpoints of every owned zone as JSON
// - `zonesyncd apply <file>`: apply a JSON change set (`create`, `updateOld`,
//   `updateNew`, `delete`); `-` reads standard input
//
// ## Configuration
//
// ### Provider
// - `ZONESYNC_PROVIDER_TYPE`: Provider type (godaddy)
// - `ZONESYNC_GODADDY_API_KEY`: API key
// - `ZONESYNC_GODADDY_API_SECRET`: API secret
// - `ZONESYNC_GODADDY_OTE`: Use the OTE test environment (true/false)
// - `ZONESYNC_GODADDY_SHOPPER_ID`: Shopper ID (optional)
// - `ZONESYNC_DRY_RUN`: Log writes instead of sending them (true/false)
//
// ### Zones
// - `ZONESYNC_DOMAIN_FILTER`: Comma-separated domains to manage (empty = all)
// - `ZONESYNC_EXCLUDE_DOMAINS`: Comma-separated domains never to touch
//
// ### Records
// - `ZONESYNC_DEFAULT_TTL`: TTL for endpoints without one (default 600)
// - `ZONESYNC_MIN_TTL`: Lowest TTL ever written (default 0)
//
// ### Logging
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export ZONESYNC_GODADDY_API_KEY=...
// export ZONESYNC_GODADDY_API_SECRET=...
// export ZONESYNC_DOMAIN_FILTER=example.net
//
// zonesyncd apply changes.json
// ```

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::config::DEFAULT_TTL;
use zonesync_core::{
    ChangeSet, DomainFilter, Error, ProviderConfig, ProviderRegistry, ReconcileEngine, SyncConfig,
    TtlPolicy,
};

/// Exit codes for different termination scenarios
///
/// - 0: Pass completed
/// - 1: Configuration or startup error
/// - 2: Runtime error (read path failed, interrupted)
/// - 3: Some changes could not be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonesyncExitCode {
    /// Pass completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
    /// Partial failure while applying changes
    ApplyFailed = 3,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Reconcile DNS endpoints with a zone-record provider.
#[derive(Parser, Debug)]
#[command(name = "zonesyncd", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current endpoints of every owned zone as JSON
    Records,

    /// Apply a JSON change set
    Apply {
        /// Change set file, `-` for standard input
        file: PathBuf,
    },
}

/// Application configuration
struct Config {
    provider_type: String,
    api_key: String,
    api_secret: String,
    ote: bool,
    shopper_id: Option<String>,
    dry_run: bool,
    domain_filter: Vec<String>,
    exclude_domains: Vec<String>,
    default_ttl: u32,
    min_ttl: u32,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps variable names to values
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            provider_type: lookup("ZONESYNC_PROVIDER_TYPE").unwrap_or_else(|| "godaddy".to_string()),
            api_key: lookup("ZONESYNC_GODADDY_API_KEY").unwrap_or_default(),
            api_secret: lookup("ZONESYNC_GODADDY_API_SECRET").unwrap_or_default(),
            ote: parse_bool("ZONESYNC_GODADDY_OTE", lookup("ZONESYNC_GODADDY_OTE"))?,
            shopper_id: lookup("ZONESYNC_GODADDY_SHOPPER_ID").filter(|s| !s.trim().is_empty()),
            dry_run: parse_bool("ZONESYNC_DRY_RUN", lookup("ZONESYNC_DRY_RUN"))?,
            domain_filter: parse_list(lookup("ZONESYNC_DOMAIN_FILTER")),
            exclude_domains: parse_list(lookup("ZONESYNC_EXCLUDE_DOMAINS")),
            default_ttl: parse_u32("ZONESYNC_DEFAULT_TTL", lookup("ZONESYNC_DEFAULT_TTL"), DEFAULT_TTL)?,
            min_ttl: parse_u32("ZONESYNC_MIN_TTL", lookup("ZONESYNC_MIN_TTL"), 0)?,
            log_level: lookup("ZONESYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.provider_type.as_str() {
            "godaddy" => {
                if self.api_key.is_empty() {
                    anyhow::bail!(
                        "ZONESYNC_GODADDY_API_KEY is required. \
                        Set it via: export ZONESYNC_GODADDY_API_KEY=your_key"
                    );
                }
                if self.api_secret.is_empty() {
                    anyhow::bail!(
                        "ZONESYNC_GODADDY_API_SECRET is required. \
                        Set it via: export ZONESYNC_GODADDY_API_SECRET=your_secret"
                    );
                }
            }
            _ => anyhow::bail!(
                "ZONESYNC_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: godaddy",
                self.provider_type
            ),
        }

        if self.default_ttl == 0 {
            anyhow::bail!("ZONESYNC_DEFAULT_TTL must be greater than 0");
        }

        self.log_level()?;
        Ok(())
    }

    fn log_level(&self) -> Result<Level> {
        Ok(match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        })
    }

    /// Build the library configuration
    fn sync_config(&self) -> SyncConfig {
        SyncConfig::new(ProviderConfig::GoDaddy {
            api_key: self.api_key.clone(),
            api_secret: self.api_secret.clone(),
            ote: self.ote,
            shopper_id: self.shopper_id.clone(),
            dry_run: self.dry_run,
        })
        .with_domain_filter(
            DomainFilter::new(&self.domain_filter).with_exclusions(&self.exclude_domains),
        )
        .with_ttl(TtlPolicy::new(self.default_ttl, self.min_ttl))
    }
}

fn parse_bool(name: &str, value: Option<String>) -> Result<bool> {
    match value.as_deref().map(str::trim).map(str::to_lowercase).as_deref() {
        None | Some("") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => anyhow::bail!("{} must be true or false. Got: {}", name, other),
    }
}

fn parse_u32(name: &str, value: Option<String>, default: u32) -> Result<u32> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a non-negative integer. Got: {}", name, raw)),
    }
}

fn parse_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    // Initialize tracing; stdout is reserved for command output
    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    info!("Starting zonesyncd");
    if config.dry_run {
        warn!("Dry-run mode: no changes will be written");
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        tokio::select! {
            code = run(cli.command, &config) => code,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, remaining changes were not applied");
                ZonesyncExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run one pass and map its outcome to an exit code
async fn run(command: Command, config: &Config) -> ZonesyncExitCode {
    let engine = match build_engine(config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return ZonesyncExitCode::ConfigError;
        }
    };

    let result = match command {
        Command::Records => print_records(&engine).await,
        Command::Apply { file } => apply(&engine, &file).await,
    };

    match result {
        Ok(()) => ZonesyncExitCode::Success,
        Err(e) => {
            error!("{:#}", e);
            match e.downcast_ref::<Error>() {
                Some(Error::Apply(_)) => ZonesyncExitCode::ApplyFailed,
                _ => ZonesyncExitCode::RuntimeError,
            }
        }
    }
}

fn build_engine(config: &Config) -> Result<ReconcileEngine> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "godaddy")]
    zonesync_provider_godaddy::register(&registry);

    info!("Registered providers: {}", registry.list_providers().join(", "));

    let sync_config = config.sync_config();
    let provider = registry.create_provider(&sync_config.provider)?;
    let (engine, mut events) = ReconcileEngine::new(provider, sync_config)?;

    // Engine events are only traced here
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::debug!("Engine event: {:?}", event);
        }
    });

    Ok(engine)
}

async fn print_records(engine: &ReconcileEngine) -> Result<()> {
    let endpoints = engine.current_endpoints().await?;
    info!("Found {} endpoint(s) via {}", endpoints.len(), engine.provider_name());
    println!("{}", serde_json::to_string_pretty(&endpoints)?);
    Ok(())
}

async fn apply(engine: &ReconcileEngine, file: &Path) -> Result<()> {
    let raw = if file.as_os_str() == "-" {
        tokio::task::spawn_blocking(|| std::io::read_to_string(std::io::stdin()))
            .await
            .context("Failed to read standard input")??
    } else {
        tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?
    };

    let changes: ChangeSet =
        serde_json::from_str(&raw).with_context(|| format!("Invalid change set in {}", file.display()))?;
    info!(
        "Applying {} create(s), {} update(s), {} delete(s)",
        changes.create.len(),
        changes.update_new.len(),
        changes.delete.len()
    );

    engine.apply_changes(&changes).await?;
    info!("All changes applied");
    Ok(())
}
