//! Dependency-audit adapter: runs the audit command and normalizes its
//! output into a [`ScanOutcome`].

use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{instrument, warn};

use crate::error::ScannerError;

const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(300);

/// User-facing message when the manifest location cannot be scanned.
pub const MISSING_MANIFEST_MESSAGE: &str =
    "The configured location for the package.json is either incorrect or missing.";

/// Structured audit output, as emitted by `npm audit --json`.
///
/// Advisory order is preserved as emitted; the report lists packages in the
/// same order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuditReport {
    pub metadata: AuditMetadata,
    #[serde(default)]
    pub advisories: IndexMap<String, Advisory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuditMetadata {
    #[serde(rename = "totalDependencies")]
    pub total_dependencies: u64,
    pub vulnerabilities: SeverityCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SeverityCounts {
    #[serde(default)]
    pub info: u64,
    #[serde(default)]
    pub low: u64,
    #[serde(default)]
    pub moderate: u64,
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub critical: u64,
}

impl SeverityCounts {
    pub fn total(&self) -> u64 {
        self.info + self.low + self.moderate + self.high + self.critical
    }
}

/// One advisory: the affected package and its CVE identifiers, in the
/// scanner's order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Advisory {
    pub module_name: String,
    #[serde(default)]
    pub cves: Vec<String>,
}

/// What one scan produced. Exactly one variant per run: either the parsed
/// audit data or a human-readable failure the user sees as the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(AuditReport),
    Failed { message: String },
}

/// Runs the audit command in a manifest directory and interprets its exit
/// status, stdout, and stderr.
#[derive(Debug, Clone)]
pub struct Scanner {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new("npm", ["audit", "--json"])
    }
}

impl Scanner {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_SCAN_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Scans the manifest at `package_location` under `workdir` (the
    /// repository root when unset).
    ///
    /// The audit tool signals "vulnerabilities found" through its exit code,
    /// so a non-zero exit is not failure by itself: only output on the error
    /// channel marks a genuine execution problem, and that comes back as
    /// [`ScanOutcome::Failed`] rather than an error. Captured stdout that is
    /// not audit JSON is a [`ScannerError::Parse`].
    #[instrument(skip(self, workdir), fields(program = %self.program))]
    pub async fn scan(
        &self,
        workdir: &Path,
        package_location: Option<&str>,
    ) -> Result<ScanOutcome, ScannerError> {
        let manifest_dir = match package_location {
            Some(subdir) => workdir.join(subdir),
            None => workdir.to_path_buf(),
        };

        if !manifest_dir.is_dir() {
            warn!(dir = %manifest_dir.display(), "manifest location does not exist");
            return Ok(ScanOutcome::Failed {
                message: MISSING_MANIFEST_MESSAGE.to_string(),
            });
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&manifest_dir)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ScannerError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|source| ScannerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        interpret(output.status.success(), &output.stdout, &output.stderr)
    }
}

fn interpret(success: bool, stdout: &[u8], stderr: &[u8]) -> Result<ScanOutcome, ScannerError> {
    if success || stderr.is_empty() {
        let report = parse_report(stdout)?;
        return Ok(ScanOutcome::Completed(report));
    }

    warn!(
        stderr = %String::from_utf8_lossy(stderr).trim(),
        "audit command failed"
    );
    Ok(ScanOutcome::Failed {
        message: MISSING_MANIFEST_MESSAGE.to_string(),
    })
}

fn parse_report(stdout: &[u8]) -> Result<AuditReport, ScannerError> {
    serde_json::from_slice(stdout).map_err(ScannerError::Parse)
}
