use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use log::{debug, error};

use crate::error::{HarnessError, Result};
use crate::genome::GenomeBuild;

pub const DEFAULT_EXECUTABLE: &str = "cnv_facets.R";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Argument vector for one call of the CNV caller.
///
/// Arguments are handed to the child as-is, no shell ever sees them, so paths
/// with spaces or shell metacharacters need no quoting.
#[derive(Debug, Clone)]
pub struct PipelineCommand {
    executable: PathBuf,
    args: Vec<OsString>,
}

impl PipelineCommand {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        PipelineCommand {
            executable: executable.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn help(self) -> Self {
        self.arg("--help")
    }

    /// Pileup input, gzip-compressed or plain CSV.
    pub fn pileup(self, pileup: impl AsRef<Path>) -> Self {
        self.arg("-p").arg(pileup.as_ref())
    }

    /// Tumour/normal BAM pair plus the germline SNP VCF used for pileup.
    pub fn bams(
        self,
        tumour: impl AsRef<Path>,
        normal: impl AsRef<Path>,
        snp_vcf: impl AsRef<Path>,
    ) -> Self {
        self.arg("-t")
            .arg(tumour.as_ref())
            .arg("-n")
            .arg(normal.as_ref())
            .arg("-vcf")
            .arg(snp_vcf.as_ref())
    }

    pub fn output(self, prefix: impl AsRef<Path>) -> Self {
        self.arg("-o").arg(prefix.as_ref())
    }

    pub fn genome(self, build: GenomeBuild) -> Self {
        self.arg("-g").arg(build.as_str())
    }

    pub fn annotation(self, bed: impl AsRef<Path>) -> Self {
        self.arg("--annotation").arg(bed.as_ref())
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn program_name(&self) -> String {
        self.executable
            .file_name()
            .unwrap_or(self.executable.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Run the caller to completion, killing it if it outlives `timeout`.
    pub fn run(&self, timeout: Duration) -> Result<Invocation> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HarnessError::Setup(format!("Failed to build Tokio runtime: {}", e)))?;

        rt.block_on(self.run_async(timeout))
    }

    async fn run_async(&self, timeout: Duration) -> Result<Invocation> {
        let program = self.program_name();
        debug!("Running {} {:?}", self.executable.display(), self.args);

        let child = tokio::process::Command::new(&self.executable)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                program: program.clone(),
                source,
            })?;

        let start = Instant::now();

        // Dropping the pending wait on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                error!("{} timed out after {}s", program, timeout.as_secs());
                return Err(HarnessError::Timeout {
                    program,
                    seconds: timeout.as_secs(),
                });
            }
        };

        let elapsed = start.elapsed();
        debug!("{} finished with {} in {:.2?}", program, output.status, elapsed);

        Ok(Invocation {
            program,
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed,
        })
    }
}

/// Captured result of a finished child process.
#[derive(Debug)]
pub struct Invocation {
    program: String,
    status: ExitStatus,
    stdout: String,
    stderr: String,
    elapsed: Duration,
}

impl Invocation {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Any non-zero status is a hard failure.
    pub fn expect_success(&self) -> Result<()> {
        if self.success() {
            Ok(())
        } else {
            Err(HarnessError::Invocation {
                program: self.program.clone(),
                code: self.code(),
                stderr: self.stderr.clone(),
            })
        }
    }

    /// Whether either output stream mentions `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.stdout.contains(needle) || self.stderr.contains(needle)
    }
}
