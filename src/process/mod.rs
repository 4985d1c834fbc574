//! Process probes used by the daemon supervisor.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

/// Check whether any process occupies `pid`.
///
/// Sends the null signal: `EPERM` still means the process exists, `ESRCH`
/// means it does not. This cannot tell *which* program owns the pid; pair it
/// with [`process_start_token`] for that.
pub fn is_process_alive(pid: u32) -> bool {
    let Some(pid) = to_pid(pid) else {
        return false;
    };

    match kill(pid, None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(Errno::ESRCH) => false,
        Err(_) => false,
    }
}

/// Deliver SIGTERM to `pid`.
pub fn terminate(pid: u32) -> nix::Result<()> {
    let pid = to_pid(pid).ok_or(Errno::EINVAL)?;
    kill(pid, Signal::SIGTERM)
}

fn to_pid(pid: u32) -> Option<Pid> {
    // pid 0 and negative values address process groups, never a single process
    match i32::try_from(pid) {
        Ok(v) if v > 0 => Some(Pid::from_raw(v)),
        _ => None,
    }
}

/// An opaque token identifying one incarnation of `pid`: its start time as
/// reported by the OS. Two different processes that reuse the same pid get
/// different tokens.
#[cfg(target_os = "linux")]
pub fn process_start_token(pid: u32) -> Option<String> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    parse_proc_start_time(&stat)
}

/// On non-Linux Unix, fall back to `ps`'s start time column.
#[cfg(all(unix, not(target_os = "linux")))]
pub fn process_start_token(pid: u32) -> Option<String> {
    let output = std::process::Command::new("ps")
        .args(["-o", "lstart=", "-p", &pid.to_string()])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}

/// Field 22 of `/proc/<pid>/stat` (starttime, in clock ticks since boot).
///
/// The command name in field 2 is parenthesised and may itself contain
/// spaces or parentheses, so fields are counted after the last `)`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_proc_start_time(stat: &str) -> Option<String> {
    let after_comm = &stat[stat.rfind(')')? + 1..];
    // after_comm starts at field 3 (state), so starttime is the 20th entry
    after_comm
        .split_whitespace()
        .nth(19)
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_is_alive() {
        assert!(is_process_alive(std::process::id()));
    }

    #[test]
    fn test_nonexistent_process_is_not_alive() {
        assert!(!is_process_alive(999_999_999));
    }

    #[test]
    fn test_pid_zero_is_never_alive() {
        // kill(0, ..) would probe our own process group
        assert!(!is_process_alive(0));
    }

    #[test]
    fn test_u32_max_overflow_returns_false() {
        assert!(!is_process_alive(u32::MAX));
    }

    #[test]
    fn test_terminate_rejects_invalid_pid() {
        assert_eq!(terminate(0), Err(Errno::EINVAL));
    }

    #[test]
    fn test_parse_start_time_with_spaces_in_command() {
        let stat = "4242 (my (odd) cmd) S 1 4242 4242 0 -1 4194560 100 0 0 0 1 2 0 0 20 0 1 0 987654 1000 10";
        assert_eq!(parse_proc_start_time(stat), Some("987654".to_string()));
    }

    #[test]
    fn test_parse_start_time_truncated() {
        assert_eq!(parse_proc_start_time("12 (sh) S 1 2"), None);
    }

    #[test]
    fn test_own_start_token_is_stable() {
        let pid = std::process::id();
        let first = process_start_token(pid);
        assert!(first.is_some());
        assert_eq!(first, process_start_token(pid));
    }
}
