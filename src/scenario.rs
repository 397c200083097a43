use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;

use crate::artifacts::OutputArtifacts;
use crate::checks::ContentCheck;
use crate::config::RunConfig;
use crate::error::{FailureKind, HarnessError, Result};
use crate::genome::GenomeBuild;
use crate::pipeline::PipelineCommand;
use crate::vcf::VcfText;

/// File name part of the `-o` prefix inside each scratch directory.
pub const OUTPUT_NAME: &str = "out";

/// What the caller is asked to start from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Help,
    Pileup(PathBuf),
    Bams {
        tumour: PathBuf,
        normal: PathBuf,
        snp_vcf: PathBuf,
    },
}

/// One named test case: the caller's arguments plus what must hold afterwards.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    description: String,
    input: Input,
    genome: Option<GenomeBuild>,
    annotation: Option<PathBuf>,
    help_mentions: Vec<String>,
    checks: Vec<ContentCheck>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input: Input) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input,
            genome: None,
            annotation: None,
            help_mentions: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn with_genome(mut self, build: GenomeBuild) -> Self {
        self.genome = Some(build);
        self
    }

    pub fn with_annotation(mut self, bed: impl Into<PathBuf>) -> Self {
        self.annotation = Some(bed.into());
        self
    }

    /// Text the caller's output streams must contain.
    pub fn expect_mention(mut self, needle: impl Into<String>) -> Self {
        self.help_mentions.push(needle.into());
        self
    }

    pub fn with_check(mut self, check: ContentCheck) -> Self {
        self.checks.push(check);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn checks(&self) -> &[ContentCheck] {
        &self.checks
    }

    pub fn produces_artifacts(&self) -> bool {
        self.input != Input::Help
    }

    pub fn uses_bam(&self) -> bool {
        matches!(self.input, Input::Bams { .. })
    }

    pub fn command(&self, executable: &Path, prefix: &Path) -> PipelineCommand {
        let command = PipelineCommand::new(executable);
        let command = match &self.input {
            Input::Help => return command.help(),
            Input::Pileup(pileup) => command.pileup(pileup),
            Input::Bams {
                tumour,
                normal,
                snp_vcf,
            } => command.bams(tumour, normal, snp_vcf),
        };

        let command = command.output(prefix);
        let command = match self.genome {
            Some(build) => command.genome(build),
            None => command,
        };
        match &self.annotation {
            Some(bed) => command.annotation(bed),
            None => command,
        }
    }

    /// Setup, invoke, assert and tear down.
    ///
    /// The scratch directory is unique to this call and removed when it goes
    /// out of scope, whichever way the assertions end.
    pub fn run(&self, config: &RunConfig) -> ScenarioOutcome {
        let start = Instant::now();
        info!("Running scenario {}", self.name);

        let scratch = tempfile::Builder::new()
            .prefix(&format!("facetscheck-{}-", self.name))
            .tempdir();

        let (result, kept_output) = match scratch {
            Ok(scratch) => {
                let result = self.execute(config, scratch.path());
                if config.keep_output {
                    let kept = scratch.keep();
                    info!("Kept output of {} in {}", self.name, kept.display());
                    (result, Some(kept))
                } else {
                    (result, None)
                }
            }
            Err(e) => (Err(HarnessError::Io(e)), None),
        };

        let elapsed_secs = start.elapsed().as_secs_f64();
        match result {
            Ok(()) => {
                info!("Scenario {} passed in {:.1}s", self.name, elapsed_secs);
                ScenarioOutcome {
                    name: self.name.clone(),
                    passed: true,
                    failure: None,
                    elapsed_secs,
                    kept_output,
                }
            }
            Err(e) => {
                warn!("Scenario {} failed: {}", self.name, e);
                ScenarioOutcome {
                    name: self.name.clone(),
                    passed: false,
                    failure: Some(Failure {
                        kind: e.kind(),
                        message: e.to_string(),
                    }),
                    elapsed_secs,
                    kept_output,
                }
            }
        }
    }

    fn execute(&self, config: &RunConfig, scratch: &Path) -> Result<()> {
        let prefix = scratch.join(OUTPUT_NAME);
        let command = self.command(&config.executable, &prefix);

        let invocation = command.run(config.timeout)?;
        invocation.expect_success()?;
        debug!("{} exited cleanly in {:.2?}", self.name, invocation.elapsed());

        for needle in &self.help_mentions {
            if !invocation.mentions(needle) {
                return Err(HarnessError::mismatch(
                    "usage text",
                    format!("output does not mention {:?}", needle),
                ));
            }
        }

        if !self.produces_artifacts() {
            return Ok(());
        }

        let artifacts = OutputArtifacts::from_prefix(&prefix, self.uses_bam());
        artifacts.verify()?;

        if self.checks.is_empty() {
            return Ok(());
        }

        let vcf = VcfText::from_gz_path(artifacts.vcf())?;
        for check in &self.checks {
            check.apply(&vcf)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

/// Result of one scenario as it appears in the report.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub passed: bool,
    pub failure: Option<Failure>,
    pub elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kept_output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cmd: &PipelineCommand) -> Vec<String> {
        cmd.args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn help_scenario_takes_no_output_prefix() {
        let scenario = Scenario::new("show_help", "usage", Input::Help).expect_mention("--tumour");
        let cmd = scenario.command(Path::new("cnv_facets.R"), Path::new("/tmp/x/out"));
        assert_eq!(strings(&cmd), vec!["--help"]);
        assert!(!scenario.produces_artifacts());
    }

    #[test]
    fn pileup_scenario_appends_genome_and_annotation() {
        let scenario = Scenario::new(
            "annotated_mouse",
            "",
            Input::Pileup(PathBuf::from("data/stomach_chr.csv.gz")),
        )
        .with_genome(GenomeBuild::Mm10)
        .with_annotation("data/annotation.bed");

        let cmd = scenario.command(Path::new("cnv_facets.R"), Path::new("scratch/out"));
        assert_eq!(
            strings(&cmd),
            vec![
                "-p",
                "data/stomach_chr.csv.gz",
                "-o",
                "scratch/out",
                "-g",
                "mm10",
                "--annotation",
                "data/annotation.bed"
            ]
        );
        assert!(!scenario.uses_bam());
    }

    #[test]
    fn bam_scenario_expects_csv() {
        let scenario = Scenario::new(
            "bam_input",
            "",
            Input::Bams {
                tumour: PathBuf::from("t.bam"),
                normal: PathBuf::from("n.bam"),
                snp_vcf: PathBuf::from("snps.vcf.gz"),
            },
        );
        assert!(scenario.uses_bam());
        assert!(scenario.produces_artifacts());
    }

    #[test]
    fn unstartable_caller_is_reported_not_raised() {
        let scenario = Scenario::new("show_help", "usage", Input::Help);
        let config = RunConfig::new("/nonexistent/cnv_facets.R");
        let outcome = scenario.run(&config);
        assert!(!outcome.passed);
        assert_eq!(outcome.failure.unwrap().kind, FailureKind::Invocation);
        assert!(outcome.kept_output.is_none());
    }
}
