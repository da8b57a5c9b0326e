// glaciertool/src/config/cli.rs
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::storage::RestoreTier;

use super::{DEFAULT_CONCURRENCY, DEFAULT_RESTORE_DAYS};

/// Lists and restores archived objects of an S3 bucket in bulk
#[derive(Parser, Debug, Clone)]
#[command(
    name = "glaciertool",
    version,
    about = "Restore millions of files of a bucket in Glacier",
    after_help = "EXAMPLES:\n    \
        glaciertool list --bucket media --region us-east-1 --access_key AK --secret_key SK\n    \
        glaciertool list_all --bucket media --region us-east-1 --partial 2019/ --file ./reports\n    \
        glaciertool restore --bucket media --region us-east-1 --days 7 --tier Bulk"
)]
pub struct Cli {
    /// Debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// JSON config file supplying connection settings missing from the command line
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List objects in archival storage classes (DEEP_ARCHIVE, GLACIER, GLACIER_IR)
    #[command(name = "list")]
    List(ListArgs),

    /// List every object regardless of storage class
    #[command(name = "list_all")]
    ListAll(ListArgs),

    /// List archived objects, then request a restore for each of them
    #[command(name = "restore")]
    Restore(RestoreArgs),
}

impl Command {
    pub fn connection(&self) -> &ConnectionArgs {
        match self {
            Command::List(args) | Command::ListAll(args) => &args.connection,
            Command::Restore(args) => &args.connection,
        }
    }

    pub fn run(&self) -> &RunArgs {
        match self {
            Command::List(args) | Command::ListAll(args) => &args.run,
            Command::Restore(args) => &args.run,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Bucket name
    #[arg(long)]
    pub bucket: Option<String>,

    /// Region name
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Access key
    #[arg(long = "access_key", env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Secret key
    #[arg(long = "secret_key", env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Custom endpoint for S3-compatible providers
    #[arg(long = "endpoint_url", env = "AWS_ENDPOINT_URL", value_name = "URL")]
    pub endpoint_url: Option<String>,

    /// Only consider keys starting with this prefix
    #[arg(long, value_name = "PREFIX")]
    pub partial: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Maximum number of in-flight tasks
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, value_name = "NUM")]
    pub concurrency: usize,

    /// Directory the report file is written to
    #[arg(long, value_name = "DIR")]
    pub file: Option<PathBuf>,

    /// Cancel the operation after this many seconds
    #[arg(long = "timeout_secs", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Hide the progress display
    #[arg(long = "no_progress")]
    pub no_progress: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            file: None,
            timeout_secs: None,
            no_progress: false,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RestoreArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub run: RunArgs,

    /// Days the restored copy stays available
    #[arg(long, default_value_t = DEFAULT_RESTORE_DAYS, value_name = "DAYS")]
    pub days: i32,

    /// Retrieval tier; the provider default applies when omitted
    #[arg(long, value_enum, ignore_case = true)]
    pub tier: Option<RestoreTier>,
}
