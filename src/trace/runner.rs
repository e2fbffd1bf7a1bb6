//! Path trace subprocess lifecycle.
//!
//! One trace runs at a time. The child's stdout is read line by line while it
//! runs and every hop line is folded into `TraceState` as soon as it arrives.
//! Stopping a trace marks it `Cancelled` immediately and the streaming task
//! kills and reaps the child.

use parking_lot::Mutex;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::ToolCommand;
use crate::error::MonitorError;
use crate::state::{SharedState, TraceFailure, TraceStatus};

/// How long to wait for the tool to exit once it closed stdout
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Starts, streams and cancels trace runs against the monitor's target
pub struct TraceRunner {
    state: SharedState,
    command: ToolCommand,
    timeout: Duration,
    shutdown: CancellationToken,
    /// Token of the run in flight. Locked before `state` whenever both are needed.
    active: Mutex<Option<CancellationToken>>,
}

impl TraceRunner {
    pub fn new(
        state: SharedState,
        command: ToolCommand,
        timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            state,
            command,
            timeout,
            shutdown,
            active: Mutex::new(None),
        }
    }

    /// Start a trace. Returns `false` without doing anything if one is running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut active = self.active.lock();

        let (generation, host) = {
            let mut state = self.state.write();
            if state.trace.is_running() {
                return false;
            }
            (state.trace.begin(), state.target_host.clone())
        };

        let cancel = self.shutdown.child_token();
        *active = Some(cancel.clone());

        let run = TraceRun {
            state: self.state.clone(),
            command: self.command.clone(),
            host,
            timeout: self.timeout,
            generation,
            cancel,
        };
        tokio::spawn(run.execute());
        true
    }

    /// Cancel the running trace. Returns `false` if nothing was running.
    ///
    /// The status leaves `Running` before this returns; hops parsed so far are
    /// kept. Safe to call from any thread.
    pub fn stop(&self) -> bool {
        let mut active = self.active.lock();

        let stopped = {
            let mut state = self.state.write();
            if state.trace.is_running() {
                state.trace.finish(TraceStatus::Cancelled, None);
                true
            } else {
                false
            }
        };

        if let Some(cancel) = active.take() {
            cancel.cancel();
        }
        if stopped {
            info!("trace cancelled");
        }
        stopped
    }

    pub fn is_running(&self) -> bool {
        self.state.read().trace.is_running()
    }
}

/// How the output stream ended
enum StreamEnd {
    Eof,
    Cancelled,
    TimedOut,
    Superseded,
    Io(std::io::Error),
}

/// One trace invocation, owned by its streaming task
struct TraceRun {
    state: SharedState,
    command: ToolCommand,
    host: String,
    timeout: Duration,
    generation: u64,
    cancel: CancellationToken,
}

impl TraceRun {
    async fn execute(self) {
        info!(host = %self.host, generation = self.generation, "trace started");

        let spawned = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(&self.host)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MonitorError::Spawn {
                program: self.command.program.clone(),
                source,
            });

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                warn!(error = %e, "trace unavailable");
                self.finish(
                    TraceStatus::Failed,
                    Some(TraceFailure::Spawn { message: e.to_string() }),
                );
                return;
            }
        };

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            kill(&mut child).await;
            self.finish(
                TraceStatus::Failed,
                Some(TraceFailure::Io { message: "output pipes unavailable".into() }),
            );
            return;
        };
        let stderr = collect_stderr(stderr);

        let end = self.stream(BufReader::new(stdout)).await;

        match end {
            StreamEnd::Eof => match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
                Ok(Ok(status)) => self.finish_exit(status, stderr).await,
                Ok(Err(e)) => {
                    self.finish(TraceStatus::Failed, Some(TraceFailure::Io { message: e.to_string() }));
                }
                Err(_) => {
                    kill(&mut child).await;
                    self.finish(TraceStatus::Failed, Some(TraceFailure::TimedOut));
                }
            },
            StreamEnd::Cancelled => {
                kill(&mut child).await;
                // A stop() already recorded the cancellation; this covers shutdown
                self.finish(TraceStatus::Cancelled, None);
            }
            StreamEnd::TimedOut => {
                kill(&mut child).await;
                warn!(host = %self.host, timeout = ?self.timeout, "trace timed out");
                self.finish(TraceStatus::Failed, Some(TraceFailure::TimedOut));
            }
            StreamEnd::Superseded => kill(&mut child).await,
            StreamEnd::Io(e) => {
                kill(&mut child).await;
                self.finish(TraceStatus::Failed, Some(TraceFailure::Io { message: e.to_string() }));
            }
        }
    }

    /// Feed output lines into the trace state until the stream ends
    async fn stream<R>(&self, reader: R) -> StreamEnd
    where
        R: tokio::io::AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return StreamEnd::Cancelled,
                _ = &mut deadline => return StreamEnd::TimedOut,
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if !self.apply(&line) {
                            return StreamEnd::Superseded;
                        }
                    }
                    Ok(None) => return StreamEnd::Eof,
                    Err(e) => return StreamEnd::Io(e),
                }
            }
        }
    }

    /// Fold one line into the state. Returns `false` once this run is no longer current.
    fn apply(&self, line: &str) -> bool {
        let mut state = self.state.write();
        if !state.trace.accepts(self.generation) {
            return false;
        }
        if state.trace.apply_line(line).is_none() {
            trace!(line, "skipped trace line");
        }
        true
    }

    async fn finish_exit(&self, status: ExitStatus, stderr: JoinHandle<String>) {
        if status.success() {
            self.finish(TraceStatus::Done, None);
            return;
        }
        let stderr = stderr.await.unwrap_or_default();
        warn!(code = ?status.code(), stderr = %stderr.trim(), "trace exited unsuccessfully");
        self.finish(
            TraceStatus::Failed,
            Some(TraceFailure::Exit {
                code: status.code(),
                stderr: crate::sanitize_display(stderr.trim()),
            }),
        );
    }

    /// Record the final status unless this run was stopped or superseded
    fn finish(&self, status: TraceStatus, failure: Option<TraceFailure>) {
        let mut state = self.state.write();
        if state.trace.accepts(self.generation) {
            state.trace.finish(status, failure);
            info!(
                status = ?status,
                hops = state.trace.summary.hop_count,
                "trace finished"
            );
        }
    }
}

fn collect_stderr(stderr: tokio::process::ChildStderr) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut buf = String::new();
        if let Err(e) = BufReader::new(stderr).read_to_string(&mut buf).await {
            debug!(error = %e, "failed to read trace stderr");
        }
        buf
    })
}

/// Kill the child and reap it
async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!(error = %e, "failed to kill trace process");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::{MonitorState, new_shared_state};

    fn runner(script: &str, timeout: Duration) -> (TraceRunner, SharedState) {
        let state = new_shared_state(&Config::for_host("192.0.2.1"));
        // The host is passed as $1 and ignored by the scripts
        let command = ToolCommand::new("sh", &["-c", script, "sh"]);
        let runner = TraceRunner::new(state.clone(), command, timeout, CancellationToken::new());
        (runner, state)
    }

    async fn wait_for(state: &SharedState, pred: impl Fn(&MonitorState) -> bool) {
        for _ in 0..200 {
            if pred(&state.read()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_streams_hops_and_completes() {
        let (runner, state) = runner(
            "printf 'traceroute to x\\n 1  10.0.0.1  4.0 ms\\n 2  * * *\\n 3  10.0.0.3  9.5 ms\\n'",
            Duration::from_secs(10),
        );
        assert!(runner.start());
        wait_for(&state, |s| !s.trace.is_running()).await;

        let state = state.read();
        assert_eq!(state.trace.status, TraceStatus::Done);
        assert_eq!(state.trace.summary.hop_count, 3);
        assert_eq!(state.trace.summary.timeout_count, 1);
        assert_eq!(state.trace.summary.max_rtt_ms, Some(9.5));
        assert!(state.trace.failure.is_none());
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails_but_keeps_hops() {
        let (runner, state) = runner(
            "echo ' 1  10.0.0.1  1.0 ms'; echo boom >&2; exit 3",
            Duration::from_secs(10),
        );
        assert!(runner.start());
        wait_for(&state, |s| !s.trace.is_running()).await;

        let state = state.read();
        assert_eq!(state.trace.status, TraceStatus::Failed);
        assert_eq!(state.trace.hops.len(), 1);
        match state.trace.failure.as_ref().unwrap() {
            TraceFailure::Exit { code, stderr } => {
                assert_eq!(*code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected failure {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_start_while_running_is_noop() {
        let (runner, state) = runner("exec sleep 30", Duration::from_secs(60));
        assert!(runner.start());
        let generation = state.read().trace.generation;

        assert!(!runner.start());
        assert_eq!(state.read().trace.generation, generation);
        assert!(runner.stop());
    }

    #[tokio::test]
    async fn test_stop_cancels_promptly_and_keeps_hops() {
        let (runner, state) = runner(
            "echo ' 1  10.0.0.1  1.0 ms'; exec sleep 30",
            Duration::from_secs(60),
        );
        assert!(runner.start());
        wait_for(&state, |s| s.trace.hops.len() == 1).await;

        assert!(runner.stop());
        {
            let state = state.read();
            assert_eq!(state.trace.status, TraceStatus::Cancelled);
            assert_eq!(state.trace.hops.len(), 1);
        }
        assert!(!runner.stop());

        // Re-armable after cancellation
        assert!(runner.start());
        assert!(runner.is_running());
        assert!(state.read().trace.hops.is_empty());
        runner.stop();
    }

    #[tokio::test]
    async fn test_deadline_kills_trace() {
        let (runner, state) = runner(
            "echo ' 1  10.0.0.1  1.0 ms'; exec sleep 30",
            Duration::from_millis(200),
        );
        assert!(runner.start());
        wait_for(&state, |s| !s.trace.is_running()).await;

        let state = state.read();
        assert_eq!(state.trace.status, TraceStatus::Failed);
        assert_eq!(state.trace.failure, Some(TraceFailure::TimedOut));
        assert_eq!(state.trace.hops.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_binary_marks_unavailable() {
        let state = new_shared_state(&Config::default());
        let runner = TraceRunner::new(
            state.clone(),
            ToolCommand::new("gms-no-such-traceroute", &[]),
            Duration::from_secs(5),
            CancellationToken::new(),
        );
        assert!(runner.start());
        wait_for(&state, |s| !s.trace.is_running()).await;

        let state = state.read();
        assert_eq!(state.trace.status, TraceStatus::Failed);
        assert!(state.trace.failure.as_ref().unwrap().is_unavailable());
    }

    #[tokio::test]
    async fn test_shutdown_token_cancels_trace() {
        let state = new_shared_state(&Config::default());
        let shutdown = CancellationToken::new();
        let runner = TraceRunner::new(
            state.clone(),
            ToolCommand::new("sh", &["-c", "exec sleep 30", "sh"]),
            Duration::from_secs(60),
            shutdown.clone(),
        );
        assert!(runner.start());
        shutdown.cancel();
        wait_for(&state, |s| !s.trace.is_running()).await;
        assert_eq!(state.read().trace.status, TraceStatus::Cancelled);
    }
}
