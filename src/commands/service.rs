//! `service:template`.

use super::common::Context;
use crate::daemon::warden_binary;
use crate::service::{Platform, ServiceSpec};
use anyhow::Result;

pub fn template(ctx: &Context, platform: Option<Platform>) -> Result<()> {
    let platform = platform.unwrap_or_else(Platform::current);
    let spec = ServiceSpec {
        binary: warden_binary()?,
        config_path: ctx.config_path().to_path_buf(),
        working_dir: ctx.config.base_dir(),
        log_file: ctx.state.log_file.clone(),
    };
    let template = platform.template();
    println!("# {} ({platform})", template.file_name());
    print!("{}", template.render(&spec));
    Ok(())
}
