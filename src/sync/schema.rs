//! Refreshing the JSON schema the managed config is validated against.

use super::validate::compile_schema;
use crate::config::{SchemaSource, WardenConfig};
use crate::error::{WardenError, WardenResult};
use crate::fs::atomic_write;
use crate::git::{run_git, run_git_checked};
use crate::logging::Logger;
use crate::runner::template::{
    VAR_CHECKOUT_DIR, VAR_LIVE_CONFIG, VAR_REPO_CONFIG, VAR_SCHEMA_FILE,
};
use crate::runner::{CommandRunner, Execute, TemplateVars};
use std::path::{Path, PathBuf};

/// What a schema update did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaUpdate {
    pub schema_file: PathBuf,
    /// Checkout the export ran in, if any.
    pub checkout: Option<PathBuf>,
    /// The export command's stdout was JSON and replaced the schema file.
    pub exported: bool,
}

/// Fetch the schema source, run the export command and make sure the
/// resulting schema compiles.
pub fn update_schema(config: &WardenConfig, logger: &Logger) -> WardenResult<SchemaUpdate> {
    let schema = &config.schema;
    let schema_file = config.schema_file_path();
    let checkout_dir = config.schema_checkout_dir();

    let checkout = match schema.source {
        SchemaSource::Git => {
            let url = schema.repo_url.as_deref().ok_or_else(|| WardenError::MalformedConfig {
                what: "warden config",
                path: config.source_path.clone(),
                reason: "schema.repoUrl is required when schema.source is \"git\"".to_string(),
            })?;
            sync_checkout(url, &schema.git_ref, &checkout_dir, logger)?;
            Some(checkout_dir)
        }
        SchemaSource::Local if schema.local_dependency => {
            if !checkout_dir.is_dir() {
                return Err(WardenError::io(
                    format!("open schema dependency {}", checkout_dir.display()),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "directory does not exist"),
                ));
            }
            Some(checkout_dir)
        }
        SchemaSource::Local => None,
    };

    let mut exported = false;
    if let (Some(dir), Some(command)) = (checkout.as_deref(), schema.export_command.as_deref()) {
        exported = run_export(command, dir, config, &schema_file, logger)?;
    }

    compile_schema(&schema_file)?;
    logger.info(format!("schema ready at {}", schema_file.display()));
    Ok(SchemaUpdate {
        schema_file,
        checkout,
        exported,
    })
}

/// Clone `url` at `git_ref`, or fetch and check it out if already cloned.
fn sync_checkout(url: &str, git_ref: &str, dir: &Path, logger: &Logger) -> WardenResult<()> {
    if dir.join(".git").exists() {
        logger.info(format!("updating schema checkout {} to {git_ref}", dir.display()));
        run_git_checked(&["fetch", "origin", git_ref], dir)?;
        run_git_checked(&["checkout", "--force", "--detach", "FETCH_HEAD"], dir)?;
        return Ok(());
    }

    let parent = dir.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .map_err(|e| WardenError::io(format!("create {}", parent.display()), e))?;
    logger.info(format!("cloning {url} ({git_ref}) into {}", dir.display()));
    let target = dir.to_string_lossy();
    let output = run_git(&["clone", "--branch", git_ref, url, target.as_ref()], parent)?;
    if !output.status.success() {
        return Err(WardenError::VersionControl {
            operation: "clone".to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// Returns whether stdout was JSON and got written to the schema file.
fn run_export(
    command: &str,
    checkout: &Path,
    config: &WardenConfig,
    schema_file: &Path,
    logger: &Logger,
) -> WardenResult<bool> {
    let vars = TemplateVars::new()
        .with(VAR_SCHEMA_FILE, schema_file.to_string_lossy())
        .with(VAR_CHECKOUT_DIR, checkout.to_string_lossy())
        .with(VAR_REPO_CONFIG, config.repo_config_path().to_string_lossy())
        .with(VAR_LIVE_CONFIG, config.live_config_path().to_string_lossy());
    let runner = CommandRunner::new().with_working_dir(checkout);
    let output = runner.execute(command, &vars)?;
    if !output.success() {
        return Err(WardenError::SubprocessFailure {
            command: vars.render(command),
            reason: output.summary(),
        });
    }

    let stdout = output.stdout.trim();
    if stdout.is_empty() || serde_json::from_str::<serde_json::Value>(stdout).is_err() {
        logger.debug("export command produced no JSON on stdout; keeping schema file as written");
        return Ok(false);
    }
    if let Some(parent) = schema_file.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| WardenError::io(format!("create {}", parent.display()), e))?;
    }
    let mut bytes = stdout.as_bytes().to_vec();
    bytes.push(b'\n');
    atomic_write(schema_file, &bytes)?;
    logger.info(format!("exported schema to {}", schema_file.display()));
    Ok(true)
}
