//! External tool invocation with captured output and an optional deadline.

use crate::error::BuildError;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::warn;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured output of a finished tool.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut all = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        all.push_str(&self.stdout);
        if !all.is_empty() && !all.ends_with('\n') {
            all.push('\n');
        }
        all.push_str(&self.stderr);
        all
    }
}

/// Run `args[0]` with the remaining arguments in `dir`.
///
/// Fails if the program cannot be started, exits unsuccessfully, or is still
/// running when `timeout` elapses. On Unix the tool runs in its own process
/// group and the whole group is killed on expiry, so helpers it forked (a
/// compiler driver's `cc1`, a wrapper's children) do not outlive it.
pub fn run_tool(
    args: &[String],
    dir: &Path,
    timeout: Option<Duration>,
) -> crate::Result<ToolOutput> {
    let command = args.join(" ");
    let (program, rest) = args
        .split_first()
        .ok_or_else(|| BuildError::EmptyCommand(dir.to_path_buf()))?;

    let spawn_err = |source| BuildError::Spawn {
        command: command.clone(),
        dir: dir.to_path_buf(),
        source,
    };

    let mut cmd = Command::new(program);
    cmd.args(rest)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    let mut child = cmd.spawn().map_err(spawn_err)?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = match timeout {
        None => child.wait().map_err(spawn_err)?,
        Some(limit) => match wait_until(&mut child, Instant::now() + limit).map_err(spawn_err)? {
            Some(status) => status,
            None => {
                kill_tree(&mut child);
                if let Err(e) = child.wait() {
                    warn!("Failed to reap timed-out `{}`: {}", command, e);
                }
                // Reader threads are detached; they end once the killed group
                // has released the pipes.
                return Err(BuildError::Timeout {
                    command,
                    dir: dir.to_path_buf(),
                    timeout: limit,
                });
            }
        },
    };

    let output = ToolOutput {
        stdout: collect(stdout),
        stderr: collect(stderr),
    };

    if !status.success() {
        return Err(BuildError::ToolFailed {
            command,
            dir: dir.to_path_buf(),
            status,
            output: output.combined().trim_end().to_string(),
        });
    }

    Ok(output)
}

fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    // The child leads its own group (see `process_group(0)`), so its pid is the pgid.
    let pgid = child.id() as libc::pid_t;
    // SAFETY: killpg has no memory-safety preconditions; a stale pgid only yields ESRCH.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        let err = std::io::Error::last_os_error();
        warn!("Failed to kill process group {}: {}", pgid, err);
        if let Err(e) = child.kill() {
            warn!("Failed to kill process {}: {}", child.id(), e);
        }
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!("Failed to kill process {}: {}", child.id(), e);
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_captures_both_streams() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_tool(&sh("echo out; echo err >&2"), dir.path(), None).unwrap();
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert_eq!(out.combined(), "out\nerr\n");
    }

    #[test]
    fn test_runs_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();
        let out = run_tool(&sh("ls"), dir.path(), None).unwrap();
        assert!(out.stdout.contains("marker"));
    }

    #[test]
    fn test_nonzero_exit_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_tool(&sh("echo broken >&2; exit 3"), dir.path(), None).unwrap_err();
        match err {
            BuildError::ToolFailed { output, status, .. } => {
                assert_eq!(output, "broken");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("expected ToolFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = vec!["/nonexistent/meson2ide-test-tool".to_string()];
        let err = run_tool(&args, dir.path(), None).unwrap_err();
        assert!(matches!(err, BuildError::Spawn { .. }));
    }

    #[test]
    fn test_timeout_kills_the_tool() {
        let dir = tempfile::tempdir().unwrap();
        let start = Instant::now();
        let err = run_tool(&sh("exec sleep 30"), dir.path(), Some(Duration::from_millis(200)))
            .unwrap_err();
        assert!(matches!(err, BuildError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_timeout_kills_forked_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let script = sh("sleep 30 & echo $! > helper.pid; wait");
        let err = run_tool(&script, dir.path(), Some(Duration::from_millis(500))).unwrap_err();
        assert!(matches!(err, BuildError::Timeout { .. }));

        let pid = std::fs::read_to_string(dir.path().join("helper.pid")).unwrap();
        let stat = format!("/proc/{}/stat", pid.trim());
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            // Gone, or a zombie waiting for init to reap it.
            let alive = match std::fs::read_to_string(&stat) {
                Ok(line) => line
                    .rsplit_once(')')
                    .and_then(|(_, rest)| rest.split_whitespace().next())
                    .is_some_and(|state| state != "Z"),
                Err(_) => false,
            };
            if !alive {
                break;
            }
            assert!(Instant::now() < deadline, "helper {} outlived the timeout", pid.trim());
            thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn test_empty_command_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            run_tool(&[], dir.path(), None),
            Err(BuildError::EmptyCommand(_))
        ));
    }
}
