use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use facetscheck::annotation::AnnotationIndex;
use facetscheck::checks::{self, ContentCheck};
use facetscheck::pipeline::{DEFAULT_EXECUTABLE, DEFAULT_TIMEOUT_SECS};
use facetscheck::{ChromNaming, GenomeBuild, RunConfig, Suite, VcfText};


pub fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .header(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NamingMode {
    /// chr-prefixed names (chr1, chrX)
    Ucsc,
    /// Bare names (1, X)
    Ensembl,
    /// Either convention, as long as it is not mixed
    Consistent,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None, styles=get_styles())]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, required = false, default_value = "2")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scenario suite against the CNV caller
    Run {
        /// CNV caller executable
        #[arg(short, long, default_value = DEFAULT_EXECUTABLE)]
        executable: PathBuf,

        /// Directory holding the scenario inputs (pileups, BAMs, annotation BED)
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// Seconds each invocation may run before it is killed
        #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// Number of scenarios to run concurrently
        #[arg(long, default_value = "1")]
        threads: usize,

        /// Only run the named scenario(s)
        #[arg(short, long)]
        scenario: Vec<String>,

        /// Keep each scenario's scratch directory
        #[arg(long, action = clap::ArgAction::SetTrue)]
        keep_output: bool,

        /// Write a JSON report to this path
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// List the built-in scenarios
    List {
        /// Directory holding the scenario inputs
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,
    },

    /// Run the content checks on an existing compressed VCF
    CheckVcf {
        /// Compressed VCF written by the caller
        vcf: PathBuf,

        /// Expected chromosome naming convention
        #[arg(long, value_enum, default_value = "consistent")]
        naming: NamingMode,

        /// Genome build whose contigs the output must respect
        #[arg(short, long)]
        genome: Option<GenomeBuild>,

        /// Annotation BED the caller was given
        #[arg(short, long)]
        annotation: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    colog::init();

    let cli = Cli::parse();
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    log::set_max_level(log_level);

    match cli.command {
        Commands::Run {
            executable,
            data_dir,
            timeout,
            threads,
            scenario,
            keep_output,
            report,
        } => {
            let suite = Suite::builtin(&data_dir)
                .select(&scenario)
                .context("Failed to select scenarios")?;

            let config = RunConfig::new(executable)
                .with_timeout(Duration::from_secs(timeout))
                .with_threads(threads)
                .with_keep_output(keep_output);

            let outcome = suite.run(&config).context("Failed to run scenarios")?;

            if let Some(report_path) = report {
                outcome
                    .write_json(&report_path)
                    .context("Failed to write report")?;
            }

            if !outcome.all_passed() {
                return Err(anyhow::anyhow!(
                    "{} of {} scenarios failed: {}",
                    outcome.failed,
                    outcome.outcomes.len(),
                    outcome.failed_names()
                ));
            }

            info!("All {} scenarios passed", outcome.passed);
        }

        Commands::List { data_dir } => {
            for scenario in Suite::builtin(&data_dir).scenarios() {
                println!("{}\t{}", scenario.name(), scenario.description());
            }
        }

        Commands::CheckVcf {
            vcf,
            naming,
            genome,
            annotation,
        } => {
            let text = VcfText::from_gz_path(&vcf)
                .with_context(|| format!("Failed to read {}", vcf.display()))?;

            let mut content_checks = vec![ContentCheck::ConsistentNaming];
            match naming {
                NamingMode::Ucsc => content_checks.push(ContentCheck::Naming(ChromNaming::Ucsc)),
                NamingMode::Ensembl => {
                    content_checks.push(ContentCheck::Naming(ChromNaming::Ensembl))
                }
                NamingMode::Consistent => {}
            }
            if let Some(build) = genome {
                content_checks.push(ContentCheck::Build(build));
            }

            for check in &content_checks {
                check.apply(&text).with_context(|| format!("Check failed: {}", check))?;
            }

            if let Some(bed) = annotation {
                let index = AnnotationIndex::from_bed(&bed)
                    .with_context(|| format!("Failed to read annotation {}", bed.display()))?;
                checks::check_annotation(&text, &[]).context("Check failed: annotation")?;
                checks::check_annotation_against_bed(&text, &index)
                    .context("Check failed: annotation overlap")?;
            }

            info!("All checks passed on {}", vcf.display());
        }
    }

    Ok(())
}
