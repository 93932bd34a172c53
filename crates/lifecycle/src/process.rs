// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Native child-process plumbing.
//!
//! Children run in their own process group so close escalation can signal
//! the whole group. Exits are reaped in a background task and arrive at the
//! engine as `Event::ProcessExited`.

use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use sam_core::{AppId, Event, KillSignal};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a pid: {0}")]
    BadPid(String),

    #[error("signal delivery failed: {0}")]
    Signal(nix::errno::Errno),

    #[error("spawned child has no pid")]
    NoPid,
}

/// Spawning and signalling for native apps.
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Fork the app executable in a fresh process group; the exit is
    /// delivered later as `Event::ProcessExited`.
    async fn spawn(
        &self,
        app_id: &AppId,
        exe: &Path,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<String, ProcessError>;

    /// Signal the app's whole process group.
    fn kill_group(&self, pid: &str, signal: KillSignal) -> Result<(), ProcessError>;
}

/// Real implementation over tokio's process support.
#[derive(Clone)]
pub struct NativeProcesses {
    event_tx: mpsc::Sender<Event>,
}

impl NativeProcesses {
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self { event_tx }
    }
}

#[async_trait]
impl ProcessAdapter for NativeProcesses {
    async fn spawn(
        &self,
        app_id: &AppId,
        exe: &Path,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<String, ProcessError> {
        let mut command = std::process::Command::new(exe);
        command.args(args).stdin(Stdio::null());
        for (key, value) in env {
            command.env(key, value);
        }
        {
            // Own process group, so SIGTERM/SIGKILL reach every descendant.
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = tokio::process::Command::from(command).spawn()?;
        let pid = match child.id() {
            Some(pid) => pid.to_string(),
            None => return Err(ProcessError::NoPid),
        };
        info!(app_id = %app_id, pid, exe = %exe.display(), "native app forked");

        let event_tx = self.event_tx.clone();
        let exited_pid = pid.clone();
        tokio::spawn(async move {
            let status = match child.wait().await {
                Ok(status) => status.code().unwrap_or(-1),
                Err(e) => {
                    warn!(pid = exited_pid, error = %e, "child wait failed");
                    -1
                }
            };
            let event = Event::ProcessExited { pid: exited_pid, status };
            let _ = event_tx.send(event).await;
        });

        Ok(pid)
    }

    fn kill_group(&self, pid: &str, signal: KillSignal) -> Result<(), ProcessError> {
        let raw: i32 = pid.parse().map_err(|_| ProcessError::BadPid(pid.to_string()))?;
        let signal = match signal {
            KillSignal::Term => Signal::SIGTERM,
            KillSignal::Kill => Signal::SIGKILL,
        };
        killpg(Pid::from_raw(raw), signal).map_err(ProcessError::Signal)
    }
}

/// One recorded spawn, for assertions.
#[derive(Debug, Clone)]
pub struct SpawnedProcess {
    pub app_id: AppId,
    pub exe: std::path::PathBuf,
    pub args: Vec<String>,
    pub pid: String,
}

#[derive(Default)]
struct FakeProcessState {
    next_pid: u32,
    spawned: Vec<SpawnedProcess>,
    killed: Vec<(String, KillSignal)>,
}

/// Recording process double: assigns pids, forks nothing.
///
/// Tests simulate exits by feeding `Event::ProcessExited` to the engine.
#[derive(Clone)]
pub struct FakeProcesses {
    state: Arc<Mutex<FakeProcessState>>,
}

impl FakeProcesses {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeProcessState {
                next_pid: 1000,
                spawned: Vec::new(),
                killed: Vec::new(),
            })),
        }
    }

    pub fn spawned(&self) -> Vec<SpawnedProcess> {
        self.state.lock().spawned.clone()
    }

    pub fn last_pid(&self) -> Option<String> {
        self.state.lock().spawned.last().map(|p| p.pid.clone())
    }

    pub fn killed(&self) -> Vec<(String, KillSignal)> {
        self.state.lock().killed.clone()
    }
}

impl Default for FakeProcesses {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcesses {
    async fn spawn(
        &self,
        app_id: &AppId,
        exe: &Path,
        args: &[String],
        _env: &[(String, String)],
    ) -> Result<String, ProcessError> {
        let mut state = self.state.lock();
        let pid = state.next_pid.to_string();
        state.next_pid += 1;
        state.spawned.push(SpawnedProcess {
            app_id: app_id.clone(),
            exe: exe.to_path_buf(),
            args: args.to_vec(),
            pid: pid.clone(),
        });
        Ok(pid)
    }

    fn kill_group(&self, pid: &str, signal: KillSignal) -> Result<(), ProcessError> {
        self.state.lock().killed.push((pid.to_string(), signal));
        Ok(())
    }
}
