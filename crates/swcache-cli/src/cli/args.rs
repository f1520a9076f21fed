use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "swcache",
    version,
    about = "Offline-first caching worker for the Hypertoons mint site"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// YAML config file (defaults plus SWCACHE_* environment when omitted)
    #[arg(long, global = true, env = "SWCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disk store root (overrides config)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Origin that relative paths resolve against (overrides config)
    #[arg(long, global = true)]
    pub origin: Option<String>,

    /// Partition version (overrides config)
    #[arg(long, global = true)]
    pub cache_version: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Precache the static assets into the current static partition
    Install,
    /// Install, then activate: delete partitions from older versions
    Activate,
    /// Route one request through the worker
    Fetch(FetchArgs),
    /// Count entries across the application's partitions
    CacheSize,
    /// Delete every partition carrying the application prefix
    Clear,
    /// Deliver a push message
    Push(PushArgs),
    /// Simulate a click on a notification
    Click(ClickArgs),
    /// Post a control message (SKIP_WAITING, GET_CACHE_SIZE)
    Message(MessageArgs),
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Absolute URL, or a path resolved against the origin
    pub url: String,

    #[arg(long, short = 'X', default_value = "GET")]
    pub method: String,

    /// Request destination, as a page would set it
    #[arg(long, value_enum, default_value_t = DestinationArg::Other)]
    pub destination: DestinationArg,

    /// Extra request header (`name: value`), repeatable
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,

    /// Print only the status line and headers
    #[arg(long)]
    pub head: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationArg {
    Document,
    Image,
    Script,
    Style,
    Font,
    Other,
}

#[derive(Args, Debug, Clone)]
pub struct PushArgs {
    /// JSON payload (`{"title", "body", "icon"?, "data"?}`); omit for an empty push
    pub payload: Option<String>,

    /// Read the payload from a file instead
    #[arg(long, conflicts_with = "payload")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ClickArgs {
    #[arg(long, default_value = "Hypertoons")]
    pub title: String,

    #[arg(long, default_value = "")]
    pub body: String,

    /// Target page carried in the notification data
    #[arg(long)]
    pub url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct MessageArgs {
    /// Message as JSON, e.g. '{"type":"GET_CACHE_SIZE"}'
    pub data: String,
}
