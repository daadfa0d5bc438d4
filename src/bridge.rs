//! Device bridge
//!
//! The extractor talks to the phone through a shell-style bridge. [`DeviceBridge`]
//! is the seam; [`AdbBridge`] implements it by running the `adb` binary.

use log::debug;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Timeout for short housekeeping commands (`adb devices`, `pm list packages`)
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors raised by the bridge itself, as opposed to the command it ran
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{0} not found; install Android SDK Platform Tools")]
    ToolMissing(PathBuf),

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to run command: {0}")]
    Spawn(#[source] io::Error),

    #[error("command exited with status {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },
}

/// Captured result of one shell invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShellOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Shell access to connected devices
pub trait DeviceBridge {
    /// Identifiers of attached devices, in the order the bridge reports them
    fn list_devices(&self) -> Result<Vec<String>, BridgeError>;

    /// Run `args` in a shell on `device_id`, giving up after `timeout`
    fn shell(
        &self,
        device_id: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ShellOutput, BridgeError>;
}

/// [`DeviceBridge`] backed by the `adb` command-line tool
#[derive(Debug, Clone)]
pub struct AdbBridge {
    adb_path: PathBuf,
}

impl Default for AdbBridge {
    fn default() -> Self {
        Self::new("adb")
    }
}

impl AdbBridge {
    pub fn new(adb_path: impl Into<PathBuf>) -> Self {
        Self {
            adb_path: adb_path.into(),
        }
    }

    pub fn adb_path(&self) -> &Path {
        &self.adb_path
    }

    fn run(&self, args: &[String], timeout: Duration) -> Result<ShellOutput, BridgeError> {
        debug!("Running {} {}", self.adb_path.display(), args.join(" "));
        let child = Command::new(&self.adb_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let child = match child {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BridgeError::ToolMissing(self.adb_path.clone()))
            }
            Err(e) => return Err(BridgeError::Spawn(e)),
        };

        wait_with_timeout(child, timeout)
    }
}

impl DeviceBridge for AdbBridge {
    fn list_devices(&self) -> Result<Vec<String>, BridgeError> {
        let output = self.run(&["devices".to_string()], DEFAULT_COMMAND_TIMEOUT)?;
        if !output.success() {
            return Err(BridgeError::CommandFailed {
                code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(parse_device_list(&output.stdout))
    }

    fn shell(
        &self,
        device_id: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ShellOutput, BridgeError> {
        let mut full_args = vec!["-s".to_string(), device_id.to_string(), "shell".to_string()];
        full_args.extend(args.iter().cloned());
        self.run(&full_args, timeout)
    }
}

const DEVICE_LIST_HEADER: &str = "List of devices attached";

/// Device serials from `adb devices` output (first column of each device line)
pub fn parse_device_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && !line.starts_with('*') && !line.starts_with(DEVICE_LIST_HEADER)
        })
        .filter_map(|line| line.split('\t').next())
        .map(str::to_string)
        .collect()
}

/// Poll `child` until it exits or `timeout` elapses, killing it on timeout.
///
/// Pipes are drained on background threads so a chatty command cannot block on
/// a full pipe while we wait for it.
fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
) -> Result<ShellOutput, BridgeError> {
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    reap(&mut child);
                    return Err(BridgeError::Timeout(timeout));
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                reap(&mut child);
                return Err(BridgeError::Spawn(e));
            }
        }
    };

    Ok(ShellOutput {
        // Killed by a signal: no exit code, report as failure
        exit_code: status.code().unwrap_or(-1),
        stdout: join_reader(stdout_reader),
        stderr: join_reader(stderr_reader),
    })
}

/// Kill a child we are giving up on and wait for it so it leaves no zombie
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(reader: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
