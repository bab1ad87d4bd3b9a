//! Client of the parser subprocess.
//!
//! The child speaks newline-delimited JSON on its standard streams: it
//! prints a [`ParserReady`] line once, then answers every [`ParseRequest`]
//! line with one [`ParseResponse`] line. A reader thread forwards stdout
//! lines over a channel so every wait has a deadline.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{ParseRequest, ParseResponse, Parser, ParserReady};
use crate::error::{Error, Result};

/// Default command: the bundled server, looked up on `PATH`.
pub const DEFAULT_PARSER_COMMAND: &str = "scala-parse-server";

/// Default per-request deadline.
pub const DEFAULT_PARSER_TIMEOUT: Duration = Duration::from_secs(60);

/// How long `stop` waits for a clean exit before killing the child.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// How to launch and talk to the parser.
#[derive(Clone, Debug)]
pub struct ParserOptions {
    pub command: PathBuf,
    pub args: Vec<String>,
    /// Deadline for the handshake and for each request.
    pub timeout: Duration,
    /// Prefix stripped from returned filenames.
    pub strip_prefix: Option<PathBuf>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            command: PathBuf::from(DEFAULT_PARSER_COMMAND),
            args: Vec::new(),
            timeout: DEFAULT_PARSER_TIMEOUT,
            strip_prefix: None,
        }
    }
}

struct Process {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Receiver<std::io::Result<String>>,
    reader: Option<JoinHandle<()>>,
}

impl Process {
    fn spawn(options: &ParserOptions) -> Result<Self> {
        let mut child = Command::new(&options.command)
            .args(&options.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::io(&options.command, e))?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::ParserExited("no stdout pipe".to_string()))?;
        let (tx, lines) = unbounded();
        let reader = thread::Builder::new()
            .name("scala-parser-reader".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })?;

        let mut process = Self {
            child,
            stdin,
            lines,
            reader: Some(reader),
        };
        let ready: ParserReady = serde_json::from_str(&process.recv(options.timeout)?)?;
        if !ready.ready {
            process.shutdown(Duration::ZERO);
            return Err(Error::ParserExited("parser reported not ready".to_string()));
        }
        info!(command = %options.command.display(), pid = process.child.id(), "parser started");
        Ok(process)
    }

    fn send(&mut self, line: &str) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| Error::ParserExited("stdin closed".to_string()))?;
        stdin.write_all(line.as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;
        Ok(())
    }

    fn recv(&mut self, timeout: Duration) -> Result<String> {
        loop {
            match self.lines.recv_timeout(timeout) {
                Ok(Ok(line)) if line.trim().is_empty() => continue,
                Ok(Ok(line)) => return Ok(line),
                Ok(Err(err)) => return Err(Error::Process(err)),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(pid = self.child.id(), ?timeout, "parser timed out, killing it");
                    self.shutdown(Duration::ZERO);
                    return Err(Error::ParserTimeout(timeout));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    let status = self.child.wait()?;
                    return Err(Error::ParserExited(status.to_string()));
                }
            }
        }
    }

    /// Close stdin, wait up to `grace` for the child to exit, then kill it.
    fn shutdown(&mut self, grace: Duration) {
        self.stdin.take();
        let deadline = Instant::now() + grace;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!(%status, "parser exited");
                    break;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                _ => {
                    if let Err(err) = self.child.kill() {
                        debug!(%err, "kill failed");
                    }
                    let _ = self.child.wait();
                    break;
                }
            }
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

/// A [`Parser`] backed by a long-lived child process, started on first use.
/// Requests are serialized.
pub struct ParserClient {
    options: RwLock<ParserOptions>,
    process: Mutex<Option<Process>>,
}

impl ParserClient {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options: RwLock::new(options),
            process: Mutex::new(None),
        }
    }

    /// Replace the options. A running child keeps its old command until
    /// the next start.
    pub fn set_options(&self, options: ParserOptions) {
        *self.options.write() = options;
    }

    pub fn options(&self) -> ParserOptions {
        self.options.read().clone()
    }

    /// Start the child now instead of on the first request.
    pub fn start(&self) -> Result<()> {
        let mut process = self.process.lock();
        if process.is_none() {
            *process = Some(Process::spawn(&self.options.read())?);
        }
        Ok(())
    }

    /// Whether a child is running.
    pub fn is_running(&self) -> bool {
        self.process.lock().is_some()
    }

    /// Close the child's input and wait for it to exit.
    pub fn stop(&self) {
        if let Some(mut process) = self.process.lock().take() {
            process.shutdown(STOP_GRACE);
        }
    }

    fn strip(&self, filename: &str) -> String {
        let options = self.options.read();
        let Some(prefix) = options.strip_prefix.as_ref().and_then(|p| p.to_str()) else {
            return filename.to_string();
        };
        match filename.strip_prefix(prefix) {
            Some(rest) => rest.trim_start_matches('/').to_string(),
            None => filename.to_string(),
        }
    }
}

impl Default for ParserClient {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl Parser for ParserClient {
    fn parse(&self, request: &ParseRequest) -> Result<ParseResponse> {
        let mut request = request.clone();
        request.filenames.sort();
        let timeout = self.options.read().timeout;

        let mut guard = self.process.lock();
        if guard.is_none() {
            *guard = Some(Process::spawn(&self.options.read())?);
        }
        let Some(process) = guard.as_mut() else {
            return Err(Error::ParserExited("parser not started".to_string()));
        };

        let exchange = process
            .send(&serde_json::to_string(&request)?)
            .and_then(|()| process.recv(timeout));
        let line = match exchange {
            Ok(line) => line,
            Err(err) => {
                guard.take();
                return Err(err);
            }
        };
        drop(guard);

        let mut response: ParseResponse = serde_json::from_str(&line)?;
        for file in &mut response.files {
            file.filename = self.strip(&file.filename);
        }
        debug!(files = response.files.len(), elapsed_ms = response.elapsed_ms, "parse response");
        Ok(response)
    }
}

impl Drop for ParserClient {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prefix() {
        let client = ParserClient::new(ParserOptions {
            strip_prefix: Some(PathBuf::from("/repo")),
            ..Default::default()
        });
        assert_eq!(client.strip("/repo/app/A.scala"), "app/A.scala");
        assert_eq!(client.strip("/other/A.scala"), "/other/A.scala");
        assert!(!client.is_running());
    }

    #[test]
    fn test_missing_command_is_an_error() {
        let client = ParserClient::new(ParserOptions {
            command: PathBuf::from("/nonexistent/scala-parse-server"),
            ..Default::default()
        });
        let err = client
            .parse(&ParseRequest {
                filenames: vec!["A.scala".into()],
            })
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(!client.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_child_times_out() {
        let client = ParserClient::new(ParserOptions {
            command: PathBuf::from("sleep"),
            args: vec!["30".into()],
            timeout: Duration::from_millis(200),
            strip_prefix: None,
        });
        let err = client.start().unwrap_err();
        assert!(matches!(err, Error::ParserTimeout(_)));
        assert!(!client.is_running());
    }
}
