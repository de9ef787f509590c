//! External-process scan engine.
//!
//! This module provides a `ScanEngine` implementation that spawns a
//! configured scanner binary (typically nmap) once per invocation.
//!
//! # Requirements
//!
//! - The scanner binary must be installed; its path is part of the engine
//!   configuration. There is no global default and no PATH discovery.
//! - Output parsing is supplied by the caller through [`OutputParser`];
//!   this crate does not interpret the engine's native format.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

use crate::core::{HostList, OutputParser, ScanEngine, ScanError};

/// How many trailing stderr lines are carried into an `EngineFailure`.
const STDERR_TAIL_LINES: usize = 4;

/// Process engine configuration.
#[derive(Debug, Clone)]
pub struct ProcessEngineConfig {
    /// Path to the scanner binary.
    pub binary: PathBuf,

    /// Arguments prepended to every invocation, before the per-scan option
    /// string (e.g. an output-format selector).
    pub base_args: Vec<String>,
}

impl ProcessEngineConfig {
    /// Creates a configuration for the given binary path.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            base_args: Vec::new(),
        }
    }

    /// Sets the arguments prepended to every invocation.
    pub fn with_base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// A scan engine backed by an external process.
///
/// Each `run` spawns one child process as
/// `binary <base_args> <options…> <target>`, captures its output, and hands
/// stdout to the configured parser. The child is spawned with
/// `kill_on_drop`, so an invocation abandoned by timeout or cancellation
/// terminates the process instead of leaking it.
///
/// # Example
///
/// ```rust,ignore
/// use scanqueue::engine::{ProcessEngineConfig, ProcessScanEngine};
///
/// let config = ProcessEngineConfig::new("/usr/bin/nmap")
///     .with_base_args(["-oX", "-"]);
/// let engine = ProcessScanEngine::new(config, my_parser)?;
/// ```
pub struct ProcessScanEngine {
    name: String,
    config: ProcessEngineConfig,
    parser: Arc<dyn OutputParser>,
}

impl ProcessScanEngine {
    /// Creates a process engine with the given configuration and parser.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when the binary path is empty.
    pub fn new<P>(config: ProcessEngineConfig, parser: P) -> Result<Self, ScanError>
    where
        P: OutputParser + 'static,
    {
        if config.binary.as_os_str().is_empty() {
            return Err(ScanError::configuration(
                "process engine requires a binary path",
            ));
        }

        let name = config
            .binary
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "process".to_string());

        Ok(Self {
            name,
            config,
            parser: Arc::new(parser),
        })
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ProcessEngineConfig {
        &self.config
    }

    fn command(&self, target: &str, options: &str) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        cmd.args(&self.config.base_args)
            .args(options.split_whitespace())
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl fmt::Debug for ProcessScanEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessScanEngine")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ScanEngine for ProcessScanEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, target: &str, options: &str) -> Result<HostList, ScanError> {
        tracing::debug!(
            engine = %self.name,
            target = %target,
            options = %options,
            "spawning scan process"
        );

        let output = self
            .command(target, options)
            .output()
            .await
            .map_err(|e| {
                ScanError::engine_failure(self.name.as_str(), target, format!("failed to spawn: {e}"))
            })?;

        if !output.status.success() {
            let reason = match stderr_tail(&output.stderr) {
                Some(tail) => format!("{}: {tail}", output.status),
                None => output.status.to_string(),
            };
            tracing::warn!(
                engine = %self.name,
                target = %target,
                status = %output.status,
                "scan process exited abnormally"
            );
            return Err(ScanError::engine_failure(self.name.as_str(), target, reason));
        }

        self.parser.parse(&output.stdout)
    }
}

/// Extracts the last few non-empty stderr lines for error context.
fn stderr_tail(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return None;
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    Some(lines[start..].join("; "))
}
