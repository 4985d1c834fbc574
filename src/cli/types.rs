use clap::{Parser, Subcommand};
use std::path::PathBuf;
use warden::service::Platform;

const HELP_TEMPLATE: &str = "
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}";

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Gateway watchdog: config sync, heartbeat and restart", long_about = None)]
#[command(version)]
#[command(help_template = HELP_TEMPLATE)]
#[command(subcommand_help_heading = "Commands")]
pub struct Cli {
    /// Config file (default: $WARDEN_CONFIG, then ./warden.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Seed the managed config from the live file and start its history
    Init,

    /// Copy the live config onto the managed copy and commit it
    #[command(name = "config:pull", alias = "pull")]
    ConfigPull,

    /// Validate the managed copy, then atomically replace the live config
    #[command(name = "config:push", alias = "push")]
    ConfigPush,

    /// Check the managed copy against the JSON schema
    #[command(name = "config:validate", alias = "validate")]
    ConfigValidate,

    /// Fetch and export the JSON schema, then make sure it compiles
    #[command(name = "schema:update")]
    SchemaUpdate,

    /// Push the managed copy every time it is edited
    Watch,

    /// Run the heartbeat schedule in the foreground
    Heartbeat {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Watch and heartbeat together in the foreground
    Run,

    /// Start the watchdog in the background
    #[command(name = "daemon:start")]
    DaemonStart,

    /// Stop the background watchdog
    #[command(name = "daemon:stop")]
    DaemonStop,

    /// Report whether the background watchdog is running
    #[command(name = "daemon:status")]
    DaemonStatus,

    /// Print a service unit that runs the watchdog at boot or login
    #[command(name = "service:template")]
    ServiceTemplate {
        /// Target init system (default: this platform's)
        #[arg(long, value_enum)]
        platform: Option<Platform>,
    },
}
