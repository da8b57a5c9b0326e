// glaciertool/src/config/mod.rs
pub mod cli;

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::listing::ListScope;
use crate::storage::RestoreParams;
use cli::{Cli, Command, ConnectionArgs, RunArgs};

/// Ceiling on in-flight tasks shared by the listing and restore pipelines.
pub const DEFAULT_CONCURRENCY: usize = 200;
/// Retention of a restored copy.
pub const DEFAULT_RESTORE_DAYS: i32 = 30;

// Structs for deserializing the optional config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonS3StorageConfig {
    pub bucket_name: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint_url: Option<String>,
    pub folder_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    pub s3_storage: Option<JsonS3StorageConfig>,
}

impl RawJsonConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self, ConfigError> {
        let file_error = |reason: String| ConfigError::File {
            path: config_path.to_path_buf(),
            reason,
        };
        let config_content = fs::read_to_string(config_path).map_err(|e| file_error(e.to_string()))?;
        serde_json::from_str(&config_content).map_err(|e| file_error(e.to_string()))
    }
}

#[derive(Clone)]
pub struct StorageSettings {
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub endpoint_url: Option<String>,
    pub prefix: Option<String>,
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("endpoint_url", &self.endpoint_url)
            .field("prefix", &self.prefix)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub concurrency: usize,
    pub output_dir: PathBuf,
    pub timeout: Option<Duration>,
    pub show_progress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List(ListScope),
    Restore(RestoreParams),
}

impl Operation {
    /// Operation name used in report file names and messages.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::List(scope) => scope.report_name(),
            Operation::Restore(_) => "restore",
        }
    }
}

/// Everything one invocation needs, resolved and validated up front.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub operation: Operation,
    pub storage: StorageSettings,
    pub run: RunSettings,
}

impl AppConfig {
    /// Resolves the command line (and the config file it names, if any).
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let raw = match &cli.config {
            Some(path) => RawJsonConfig::load_from_json(path)?,
            None => RawJsonConfig::default(),
        };
        Self::resolve(&cli.command, &raw)
    }

    pub fn resolve(command: &Command, raw: &RawJsonConfig) -> Result<Self, ConfigError> {
        let operation = match command {
            Command::List(_) => Operation::List(ListScope::Archival),
            Command::ListAll(_) => Operation::List(ListScope::All),
            Command::Restore(args) => {
                if args.days < 1 {
                    return Err(ConfigError::InvalidValue {
                        field: "days",
                        reason: format!("must be at least 1, got {}", args.days),
                    });
                }
                Operation::Restore(RestoreParams {
                    days: args.days,
                    tier: args.tier,
                })
            }
        };

        let storage = resolve_storage(command.connection(), raw.s3_storage.as_ref())?;
        let run = resolve_run(command.run())?;

        Ok(AppConfig {
            operation,
            storage,
            run,
        })
    }
}

/// First non-blank value, command line before config file.
fn pick(cli_value: &Option<String>, json_value: Option<&Option<String>>) -> Option<String> {
    let json_value = json_value.and_then(|v| v.as_ref());
    [cli_value.as_ref(), json_value]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn resolve_storage(
    args: &ConnectionArgs,
    json: Option<&JsonS3StorageConfig>,
) -> Result<StorageSettings, ConfigError> {
    let bucket = pick(&args.bucket, json.map(|j| &j.bucket_name)).ok_or(ConfigError::MissingBucket)?;
    let region = pick(&args.region, json.map(|j| &j.region)).ok_or(ConfigError::MissingRegion)?;
    let access_key = pick(&args.access_key, json.map(|j| &j.access_key_id));
    let secret_key = pick(&args.secret_key, json.map(|j| &j.secret_access_key));
    let (Some(access_key), Some(secret_key)) = (access_key, secret_key) else {
        return Err(ConfigError::MissingCredentials);
    };

    let endpoint_url = pick(&args.endpoint_url, json.map(|j| &j.endpoint_url));
    if let Some(endpoint) = &endpoint_url {
        validate_endpoint(endpoint)?;
    }

    // The prefix is passed through untrimmed; keys may legitimately start with spaces.
    let prefix = args
        .partial
        .clone()
        .or_else(|| json.and_then(|j| j.folder_prefix.clone()))
        .filter(|p| !p.is_empty());

    Ok(StorageSettings {
        bucket,
        region,
        access_key,
        secret_key,
        endpoint_url,
        prefix,
    })
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        url: endpoint.to_string(),
        reason,
    };
    let parsed = url::Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

fn resolve_run(args: &RunArgs) -> Result<RunSettings, ConfigError> {
    if args.concurrency == 0 {
        return Err(ConfigError::InvalidValue {
            field: "concurrency",
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(RunSettings {
        concurrency: args.concurrency,
        output_dir: args.file.clone().unwrap_or_else(|| PathBuf::from(".")),
        timeout: args.timeout_secs.map(Duration::from_secs),
        show_progress: !args.no_progress,
    })
}
