use anyhow::Result;
use warden::commands::{config, daemon, heartbeat, init, run, schema, service, watch, Context};

use super::types::{Cli, Commands};

pub fn dispatch(cli: Cli) -> Result<()> {
    let ctx = Context::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => init::execute(&ctx),
        Commands::ConfigPull => config::pull(&ctx),
        Commands::ConfigPush => config::push(&ctx),
        Commands::ConfigValidate => config::validate(&ctx),
        Commands::SchemaUpdate => schema::update(&ctx),
        Commands::Watch => watch::execute(&ctx),
        Commands::Heartbeat { once } => heartbeat::execute(&ctx, once),
        Commands::Run => run::execute(&ctx),
        Commands::DaemonStart => daemon::start(&ctx),
        Commands::DaemonStop => daemon::stop(&ctx),
        Commands::DaemonStatus => daemon::status(&ctx),
        Commands::ServiceTemplate { platform } => service::template(&ctx, platform),
    }
}
