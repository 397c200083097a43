use std::io::Write;
use std::path::{Path, PathBuf};

use indicatif::{ParallelProgressIterator, ProgressIterator};
use itertools::Itertools;
use log::{error, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::checks::{ContentCheck, RecordExpectation};
use crate::config::RunConfig;
use crate::error::{HarnessError, Result};
use crate::genome::{ChromNaming, GenomeBuild};
use crate::scenario::{Input, Scenario, ScenarioOutcome};

/// Record the annotation scenario pins down: one CNV overlapping several
/// entries, whose names need escaping.
pub const SEED_RECORD_PREFIX: &str = "chr1\t69";
pub const SEED_RECORD_ANNOTATION: &str = "C,A,B,gene%3Db%3BGene%2CFoo";

pub fn progress_bar(length: u64, message: String) -> indicatif::ProgressBar {
    let progress_style = indicatif::ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    )
    .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
    .progress_chars("##-");

    let progress_bar = indicatif::ProgressBar::new(length);
    progress_bar.set_style(progress_style);
    progress_bar.set_message(message);
    progress_bar
}

/// The standard scenarios, with inputs resolved against `data_dir`.
pub fn builtin_scenarios(data_dir: &Path) -> Vec<Scenario> {
    let data = |name: &str| data_dir.join(name);

    vec![
        Scenario::new("show_help", "Usage text is printed and mentions --tumour", Input::Help)
            .expect_mention("--tumour"),
        Scenario::new(
            "compressed_pileup",
            "Gzip-compressed pileup input produces VCF and plots",
            Input::Pileup(data("pileup.csv.gz")),
        ),
        Scenario::new(
            "uncompressed_pileup",
            "Plain CSV pileup input produces VCF and plots",
            Input::Pileup(data("pileup.csv")),
        ),
        Scenario::new(
            "bam_input",
            "Tumour/normal BAM input also keeps the pileup CSV",
            Input::Bams {
                tumour: data("tumour.bam"),
                normal: data("normal.bam"),
                snp_vcf: data("snps.vcf.gz"),
            },
        ),
        Scenario::new(
            "real_dataset",
            "Full stomach dataset runs to completion",
            Input::Pileup(data("stomach.csv.gz")),
        ),
        Scenario::new(
            "ensembl_chromosomes",
            "Bare chromosome names stay bare and chromosome 23 is reported as X",
            Input::Pileup(data("stomach.csv.gz")),
        )
        .with_check(ContentCheck::Naming(ChromNaming::Ensembl))
        .with_check(ContentCheck::ConsistentNaming),
        Scenario::new(
            "ucsc_chromosomes",
            "chr-prefixed names stay prefixed and chromosome 23 is reported as chrX",
            Input::Pileup(data("stomach_chr.csv.gz")),
        )
        .with_check(ContentCheck::Naming(ChromNaming::Ucsc))
        .with_check(ContentCheck::ConsistentNaming),
        Scenario::new(
            "mouse_genome",
            "mm10 output has no chromosomes beyond chr19",
            Input::Pileup(data("stomach_chr.csv.gz")),
        )
        .with_genome(GenomeBuild::Mm10)
        .with_check(ContentCheck::Build(GenomeBuild::Mm10))
        .with_check(ContentCheck::ConsistentNaming),
        Scenario::new(
            "annotation",
            "Every record carries CNV_ANN with escaped, comma-joined names",
            Input::Pileup(data("stomach_chr.csv.gz")),
        )
        .with_annotation(data("annotation.bed"))
        .with_check(ContentCheck::Annotation(vec![RecordExpectation::new(
            SEED_RECORD_PREFIX,
            SEED_RECORD_ANNOTATION,
        )]))
        .with_check(ContentCheck::AnnotationMatchesBed(data("annotation.bed"))),
    ]
}

pub struct Suite {
    scenarios: Vec<Scenario>,
}

impl Suite {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self { scenarios }
    }

    pub fn builtin(data_dir: &Path) -> Self {
        Self::new(builtin_scenarios(data_dir))
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Keep only the named scenarios, in catalogue order. An empty selection keeps all.
    pub fn select(self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self);
        }

        if let Some(unknown) = names
            .iter()
            .find(|name| !self.scenarios.iter().any(|s| s.name() == name.as_str()))
        {
            return Err(HarnessError::UnknownScenario(unknown.clone()));
        }

        let scenarios = self
            .scenarios
            .into_iter()
            .filter(|s| names.iter().any(|name| name == s.name()))
            .collect();
        Ok(Self { scenarios })
    }

    /// Run every scenario. Failures are collected into the report rather
    /// than stopping the run.
    pub fn run(&self, config: &RunConfig) -> Result<SuiteReport> {
        info!(
            "Running {} scenarios against {} on {} thread(s)",
            self.scenarios.len(),
            config.executable.display(),
            config.threads
        );

        let progress = progress_bar(self.scenarios.len() as u64, "scenarios".to_string());

        let outcomes: Vec<ScenarioOutcome> = if config.threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build()
                .map_err(|e| HarnessError::Setup(e.to_string()))?;
            pool.install(|| {
                self.scenarios
                    .par_iter()
                    .progress_with(progress.clone())
                    .map(|scenario| {
                        progress.set_message(scenario.name().to_string());
                        scenario.run(config)
                    })
                    .collect()
            })
        } else {
            self.scenarios
                .iter()
                .progress_with(progress.clone())
                .map(|scenario| {
                    progress.set_message(scenario.name().to_string());
                    scenario.run(config)
                })
                .collect()
        };
        progress.finish_and_clear();

        let report = SuiteReport::new(config.executable.clone(), outcomes);
        for outcome in report.failures() {
            if let Some(failure) = &outcome.failure {
                error!("{} failed: {}", outcome.name, failure.message);
            }
        }
        info!("{} passed, {} failed", report.passed, report.failed);
        Ok(report)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub executable: PathBuf,
    pub passed: usize,
    pub failed: usize,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    pub fn new(executable: PathBuf, outcomes: Vec<ScenarioOutcome>) -> Self {
        let (passed, failed) = outcomes
            .iter()
            .fold((0, 0), |(p, f), o| if o.passed { (p + 1, f) } else { (p, f + 1) });
        Self {
            executable,
            passed,
            failed,
            outcomes,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    pub fn failed_names(&self) -> String {
        self.failures().map(|o| o.name.as_str()).join(", ")
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| HarnessError::Setup(format!("Failed to serialize report: {}", e)))?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        info!("Wrote report to {}", path.display());
        Ok(())
    }
}
