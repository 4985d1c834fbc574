//! `{name}` placeholder substitution for command templates.
//!
//! Every substituted value is shell-escaped, so data read from the health
//! cache cannot smuggle shell syntax into a command. Templates must therefore
//! leave placeholders unquoted: write `--agent {agentId}`, not
//! `--agent '{agentId}'`.

use regex::{Captures, Regex};
use shell_escape::escape;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const VAR_CYCLE_ID: &str = "cycleId";
pub const VAR_REPO_CONFIG: &str = "repoConfig";
pub const VAR_LIVE_CONFIG: &str = "liveConfig";
pub const VAR_AGENT_ID: &str = "agentId";
pub const VAR_SESSION_ID: &str = "sessionId";
pub const VAR_SESSION_KEY: &str = "sessionKey";
pub const VAR_SESSIONS_PATH: &str = "sessionsPath";
pub const VAR_HEALTH_CACHE: &str = "healthCache";
pub const VAR_SCHEMA_FILE: &str = "schemaFile";
pub const VAR_CHECKOUT_DIR: &str = "checkoutDir";

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z][A-Za-z0-9_]*)\}").expect("valid placeholder regex"))
}

/// Named values available to a command template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    values: BTreeMap<String, String>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set `name` only when a value is present.
    pub fn with_opt(mut self, name: &str, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = value {
            self.set(name, value);
        }
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Substitute every `{name}` in `template`.
    ///
    /// Known names become their shell-escaped value; unknown names become
    /// the empty string.
    pub fn render(&self, template: &str) -> String {
        placeholder_re()
            .replace_all(template, |caps: &Captures| match self.values.get(&caps[1]) {
                Some(value) => escape(Cow::Borrowed(value.as_str())).into_owned(),
                None => String::new(),
            })
            .into_owned()
    }
}
