//! Service unit rendering for running `warden run` under the host's init
//! system. Rendering only: nothing is installed.

use crate::config::CONFIG_ENV;
use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;

const SERVICE_NAME: &str = "warden";
const LAUNCHD_LABEL: &str = "dev.warden.watchdog";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Platform {
    Systemd,
    Launchd,
    Windows,
}

impl Platform {
    /// The init system of the machine warden was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Launchd
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Systemd
        }
    }

    pub fn template(self) -> Box<dyn ServiceTemplate> {
        match self {
            Platform::Systemd => Box::new(SystemdUnit),
            Platform::Launchd => Box::new(LaunchdPlist),
            Platform::Windows => Box::new(ScheduledTask),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Systemd => "systemd",
            Platform::Launchd => "launchd",
            Platform::Windows => "windows",
        })
    }
}

/// What the rendered unit runs.
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    pub binary: PathBuf,
    pub config_path: PathBuf,
    pub working_dir: PathBuf,
    pub log_file: PathBuf,
}

pub trait ServiceTemplate {
    /// Conventional file name for the rendered unit.
    fn file_name(&self) -> String;

    fn render(&self, spec: &ServiceSpec) -> String;
}

pub struct SystemdUnit;

impl ServiceTemplate for SystemdUnit {
    fn file_name(&self) -> String {
        format!("{SERVICE_NAME}.service")
    }

    fn render(&self, spec: &ServiceSpec) -> String {
        format!(
            "[Unit]\n\
             Description=warden gateway watchdog\n\
             After=network-online.target\n\
             \n\
             [Service]\n\
             Type=simple\n\
             ExecStart={exec} run\n\
             Environment={env}\n\
             WorkingDirectory={workdir}\n\
             Restart=on-failure\n\
             RestartSec=10\n\
             \n\
             [Install]\n\
             WantedBy=default.target\n",
            exec = systemd_quote(&spec.binary.to_string_lossy()),
            env = systemd_quote(&format!(
                "{CONFIG_ENV}={}",
                spec.config_path.to_string_lossy()
            )),
            workdir = systemd_quote(&spec.working_dir.to_string_lossy()),
        )
    }
}

/// systemd splits on whitespace unless the word is double-quoted.
fn systemd_quote(value: &str) -> String {
    if value.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\') {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

pub struct LaunchdPlist;

impl ServiceTemplate for LaunchdPlist {
    fn file_name(&self) -> String {
        format!("{LAUNCHD_LABEL}.plist")
    }

    fn render(&self, spec: &ServiceSpec) -> String {
        let log = xml_escape(&spec.log_file.to_string_lossy());
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>Label</key>
  <string>{label}</string>
  <key>ProgramArguments</key>
  <array>
    <string>{binary}</string>
    <string>run</string>
  </array>
  <key>EnvironmentVariables</key>
  <dict>
    <key>{env_key}</key>
    <string>{config}</string>
  </dict>
  <key>WorkingDirectory</key>
  <string>{workdir}</string>
  <key>RunAtLoad</key>
  <true/>
  <key>KeepAlive</key>
  <true/>
  <key>StandardOutPath</key>
  <string>{log}</string>
  <key>StandardErrorPath</key>
  <string>{log}</string>
</dict>
</plist>
"#,
            label = LAUNCHD_LABEL,
            binary = xml_escape(&spec.binary.to_string_lossy()),
            env_key = CONFIG_ENV,
            config = xml_escape(&spec.config_path.to_string_lossy()),
            workdir = xml_escape(&spec.working_dir.to_string_lossy()),
        )
    }
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// A `schtasks` invocation registering warden to start at logon.
pub struct ScheduledTask;

impl ServiceTemplate for ScheduledTask {
    fn file_name(&self) -> String {
        format!("{SERVICE_NAME}-task.cmd")
    }

    fn render(&self, spec: &ServiceSpec) -> String {
        let action = format!(
            "cmd /C \\\"set {CONFIG_ENV}={config}&& cd /D \\\"{workdir}\\\" && \\\"{binary}\\\" run\\\"",
            config = spec.config_path.to_string_lossy(),
            workdir = spec.working_dir.to_string_lossy(),
            binary = spec.binary.to_string_lossy(),
        );
        format!(
            "@echo off\r\n\
             schtasks /Create /F /TN \"{SERVICE_NAME}\" /SC ONLOGON /RL LIMITED /TR \"{action}\"\r\n"
        )
    }
}
