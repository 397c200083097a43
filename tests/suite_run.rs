#![cfg(unix)]

mod common;

use std::time::Duration;

use common::{install_fake_caller, test_data_dir};
use facetscheck::checks::ContentCheck;
use facetscheck::{ChromNaming, FailureKind, Input, RunConfig, Scenario, Suite};

#[test]
fn builtin_suite_passes_sequentially() {
    let caller = install_fake_caller("ok");
    let config = RunConfig::new(&caller.executable).with_timeout(Duration::from_secs(60));

    let report = Suite::builtin(&test_data_dir()).run(&config).unwrap();

    assert!(report.all_passed(), "failures: {}", report.failed_names());
    assert_eq!(report.passed, 9);
    assert!(report.outcomes.iter().all(|o| o.kept_output.is_none()));
}

#[test]
fn builtin_suite_passes_in_parallel() {
    let caller = install_fake_caller("ok");
    let config = RunConfig::new(&caller.executable)
        .with_timeout(Duration::from_secs(60))
        .with_threads(4);

    let report = Suite::builtin(&test_data_dir()).run(&config).unwrap();

    assert!(report.all_passed(), "failures: {}", report.failed_names());
    let names: Vec<&str> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names.first(), Some(&"show_help"));
    assert_eq!(names.last(), Some(&"annotation"));
}

#[test]
fn scratch_dir_is_removed_after_failed_invocation() {
    let caller = install_fake_caller("fail");
    let config = RunConfig::new(&caller.executable);
    let scenario = Scenario::new(
        "failing_caller",
        "",
        Input::Pileup(test_data_dir().join("pileup.csv.gz")),
    );

    let outcome = scenario.run(&config);
    assert!(!outcome.passed);
    assert_eq!(outcome.failure.unwrap().kind, FailureKind::Invocation);
    assert!(outcome.kept_output.is_none());

    let outputs = caller.recorded_outputs();
    assert_eq!(outputs.len(), 1);
    let scratch = outputs[0].parent().unwrap();
    assert!(
        scratch
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("facetscheck-failing_caller-")
    );
    assert!(!scratch.exists());
}

#[test]
fn scratch_dir_is_removed_after_content_mismatch() {
    let caller = install_fake_caller("mixed");
    let config = RunConfig::new(&caller.executable);
    let scenario = Scenario::new(
        "mixed_naming",
        "",
        Input::Pileup(test_data_dir().join("stomach_chr.csv.gz")),
    )
    .with_check(ContentCheck::ConsistentNaming);

    let outcome = scenario.run(&config);
    assert_eq!(outcome.failure.unwrap().kind, FailureKind::ContentMismatch);

    let outputs = caller.recorded_outputs();
    assert_eq!(outputs.len(), 1);
    assert!(!outputs[0].with_extension("vcf.gz").exists());
    assert!(!outputs[0].parent().unwrap().exists());
}

#[test]
fn reruns_reproduce_the_artifact_set() {
    let caller = install_fake_caller("ok");
    let config = RunConfig::new(&caller.executable).with_keep_output(true);
    let scenario = Scenario::new(
        "bam_rerun",
        "",
        Input::Bams {
            tumour: "tumour.bam".into(),
            normal: "normal.bam".into(),
            snp_vcf: "snps.vcf.gz".into(),
        },
    );

    let listings: Vec<Vec<String>> = (0..2)
        .map(|_| {
            let outcome = scenario.run(&config);
            assert!(outcome.passed);
            let kept = outcome.kept_output.expect("scratch kept");
            let mut names: Vec<String> = std::fs::read_dir(&kept)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            std::fs::remove_dir_all(&kept).unwrap();
            names
        })
        .collect();

    assert_eq!(listings[0], listings[1]);
    assert_eq!(
        listings[0],
        vec!["out.cnv.png", "out.csv.gz", "out.spider.pdf", "out.vcf.gz"]
    );
}

#[test]
fn custom_scenario_reports_content_mismatch() {
    let caller = install_fake_caller("ok");
    let config = RunConfig::new(&caller.executable);

    // Ensembl input checked as if it were UCSC.
    let scenario = Scenario::new(
        "wrong_convention",
        "",
        Input::Pileup(test_data_dir().join("stomach.csv.gz")),
    )
    .with_check(ContentCheck::Naming(ChromNaming::Ucsc));

    let outcome = scenario.run(&config);
    assert!(!outcome.passed);
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::ContentMismatch);
    assert!(failure.message.contains("chr1"));
}
