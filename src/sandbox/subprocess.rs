//! Out-of-process executor
//!
//! Every attempt gets its own temporary directory holding the candidate, the
//! runner shim and the output file. The interpreter runs there with a cleared
//! environment and a wall-clock timeout; the directory is removed afterwards.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::dataset::RawTable;
use crate::error::{ParsegenError, Result};
use crate::sandbox::executor::{ExecutionError, Executor};

/// File the runner writes the produced table to
const OUTPUT_FILE: &str = "produced.csv";

/// Keep the end of stderr, where tracebacks put the actual error
const MAX_STDERR_CHARS: usize = 4000;

/// Variables the child inherits from the parent; everything else is dropped
const BASE_ENV: &[&str] = &["PATH", "HOME", "LANG", "LC_ALL", "SYSTEMROOT"];

/// Runner shim and interpreter for a candidate language
#[derive(Debug, Clone)]
pub struct RunnerShim {
    /// Interpreter program
    pub program: String,
    /// Shim source; invoked as `<program> <runner> <candidate> <sample> <output>`
    pub source: String,
    pub runner_file: String,
    pub candidate_file: String,
}

impl RunnerShim {
    /// Python runner: loads `parse` from a fresh module, writes the DataFrame as CSV
    pub fn python(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            source: include_str!("runner.py").to_string(),
            runner_file: "runner.py".to_string(),
            candidate_file: "candidate.py".to_string(),
        }
    }

    /// POSIX shell runner: sources the candidate and calls its `parse` function
    pub fn shell() -> Self {
        Self {
            program: "sh".to_string(),
            source: include_str!("runner.sh").to_string(),
            runner_file: "runner.sh".to_string(),
            candidate_file: "candidate.sh".to_string(),
        }
    }
}

/// Configuration for the subprocess executor
#[derive(Debug, Clone)]
pub struct SubprocessConfig {
    pub shim: RunnerShim,
    pub timeout: Duration,
    /// Extra variables passed through to the child (e.g. `PYTHONPATH`)
    pub pass_env: Vec<String>,
    /// Prefix for per-attempt directory names
    pub namespace: String,
}

impl SubprocessConfig {
    pub fn new(shim: RunnerShim) -> Self {
        Self {
            shim,
            timeout: Duration::from_secs(120),
            pass_env: Vec::new(),
            namespace: "parsegen".to_string(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn pass_env(mut self, name: impl Into<String>) -> Self {
        self.pass_env.push(name.into());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

/// Runs candidates in a child interpreter process
pub struct SubprocessExecutor {
    config: SubprocessConfig,
    description: String,
}

impl SubprocessExecutor {
    pub fn new(config: SubprocessConfig) -> Self {
        let description = format!("{} subprocess", config.shim.program);
        Self {
            config,
            description,
        }
    }

    pub fn config(&self) -> &SubprocessConfig {
        &self.config
    }

    /// Resolve the interpreter on PATH
    pub fn check_interpreter(&self) -> Result<PathBuf> {
        which::which(&self.config.shim.program).map_err(|e| {
            ParsegenError::Config(format!(
                "interpreter '{}' not found: {}",
                self.config.shim.program, e
            ))
        })
    }

    /// Create the attempt's private directory with candidate and runner inside
    fn prepare_workspace(&self, code: &str) -> std::io::Result<tempfile::TempDir> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}_", self.config.namespace))
            .tempdir()?;
        std::fs::write(dir.path().join(&self.config.shim.candidate_file), code)?;
        std::fs::write(dir.path().join(&self.config.shim.runner_file), &self.config.shim.source)?;
        Ok(dir)
    }

    fn build_command(&self, workdir: &Path, sample: &Path) -> Command {
        let shim = &self.config.shim;
        let mut cmd = Command::new(&shim.program);
        cmd.arg(workdir.join(&shim.runner_file))
            .arg(workdir.join(&shim.candidate_file))
            .arg(sample)
            .arg(workdir.join(OUTPUT_FILE))
            .current_dir(workdir)
            .env_clear();

        for name in BASE_ENV
            .iter()
            .copied()
            .chain(self.config.pass_env.iter().map(String::as_str))
        {
            if let Ok(value) = std::env::var(name) {
                cmd.env(name, value);
            }
        }
        // Scratch files the candidate creates die with the workspace
        cmd.env("TMPDIR", workdir);

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn read_output(workdir: &Path) -> std::result::Result<RawTable, ExecutionError> {
        let output = workdir.join(OUTPUT_FILE);
        if !output.exists() {
            return Err(ExecutionError::MissingOutput);
        }
        let table = RawTable::from_csv_path(&output)
            .map_err(|e| ExecutionError::MalformedOutput(e.to_string()))?;
        if table.headers.is_empty() {
            return Err(ExecutionError::MissingOutput);
        }
        Ok(table)
    }
}

/// Last `max` characters of `text`, trimmed
fn tail(text: &str, max: usize) -> String {
    let text = text.trim();
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let skipped: String = text.chars().skip(count - max).collect();
    format!("...{}", skipped)
}

#[async_trait]
impl Executor for SubprocessExecutor {
    async fn execute(&self, code: &str, sample: &Path) -> std::result::Result<RawTable, ExecutionError> {
        if code.trim().is_empty() {
            return Err(ExecutionError::EmptyCode);
        }

        let sample = std::path::absolute(sample).map_err(ExecutionError::Workspace)?;
        let workdir = self.prepare_workspace(code).map_err(ExecutionError::Workspace)?;
        log::debug!("Executing candidate in {}", workdir.path().display());

        let child = self
            .build_command(workdir.path(), &sample)
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                program: self.config.shim.program.clone(),
                source,
            })?;

        // On timeout the child future is dropped and kill_on_drop reaps it
        let output = match tokio::time::timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| ExecutionError::Spawn {
                program: self.config.shim.program.clone(),
                source,
            })?,
            Err(_) => {
                return Err(ExecutionError::Timeout {
                    ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExecutionError::Failed {
                exit_code: output.status.code(),
                stderr: tail(&stderr, MAX_STDERR_CHARS),
            });
        }

        let table = Self::read_output(workdir.path());
        if let Err(e) = workdir.close() {
            log::warn!("Failed to remove execution workspace: {}", e);
        }
        table
    }

    fn description(&self) -> &str {
        &self.description
    }
}
