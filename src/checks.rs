//! Content predicates over a decoded VCF.
//!
//! Each check returns the first predicate that does not hold as a
//! [`HarnessError::ContentMismatch`] naming the check and the offending line.

use std::fmt::Display;
use std::path::PathBuf;

use ahash::HashSet;
use log::debug;

use crate::annotation::{AnnotationIndex, NO_ANNOTATION, split_annotation};
use crate::error::{HarnessError, Result};
use crate::genome::{ChromNaming, GenomeBuild, autosome_number};
use crate::vcf::VcfText;

pub const ANNOTATION_KEY: &str = "CNV_ANN";
const NEUTRAL_CALL: &str = "NEUTR";

fn require(condition: bool, check: &'static str, detail: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(HarnessError::mismatch(check, detail()))
    }
}

fn is_chrom_23(token: &str) -> bool {
    token == "23" || token == "chr23"
}

/// A record expected in annotated output: some record line must start with
/// `prefix`, and every such line must contain `contains`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordExpectation {
    pub prefix: String,
    pub contains: String,
}

impl RecordExpectation {
    pub fn new(prefix: impl Into<String>, contains: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            contains: contains.into(),
        }
    }
}

/// Content assertions a scenario can attach to its VCF output.
#[derive(Debug, Clone)]
pub enum ContentCheck {
    Naming(ChromNaming),
    ConsistentNaming,
    Build(GenomeBuild),
    Annotation(Vec<RecordExpectation>),
    AnnotationMatchesBed(PathBuf),
}

impl ContentCheck {
    pub fn apply(&self, vcf: &VcfText) -> Result<()> {
        debug!("Applying check: {}", self);
        match self {
            ContentCheck::Naming(naming) => check_chrom_naming(vcf, *naming),
            ContentCheck::ConsistentNaming => check_consistent_naming(vcf),
            ContentCheck::Build(build) => check_genome_build(vcf, *build),
            ContentCheck::Annotation(expectations) => check_annotation(vcf, expectations),
            ContentCheck::AnnotationMatchesBed(bed) => {
                let index = AnnotationIndex::from_bed(bed)?;
                check_annotation_against_bed(vcf, &index)
            }
        }
    }
}

impl Display for ContentCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentCheck::Naming(naming) => write!(f, "{} chromosome names", naming),
            ContentCheck::ConsistentNaming => write!(f, "consistent chromosome names"),
            ContentCheck::Build(build) => write!(f, "{} contigs", build),
            ContentCheck::Annotation(_) => write!(f, "{} on every record", ANNOTATION_KEY),
            ContentCheck::AnnotationMatchesBed(bed) => {
                write!(f, "{} agrees with {}", ANNOTATION_KEY, bed.display())
            }
        }
    }
}

/// Contigs and records follow `naming`, the sex chromosome is called X
/// (never 23), and the output ends on X.
pub fn check_chrom_naming(vcf: &VcfText, naming: ChromNaming) -> Result<()> {
    const CHECK: &str = "chromosome naming";

    let contigs = vcf.contig_ids();
    let chr1 = naming.format("1");
    let chr_x = naming.format("X");
    let other_x = naming.other().format("X");

    require(contigs.contains(&chr1.as_str()), CHECK, || {
        format!("no ##contig=<ID={}> header", chr1)
    })?;
    require(contigs.contains(&chr_x.as_str()), CHECK, || {
        format!("no ##contig=<ID={}> header", chr_x)
    })?;
    require(!contigs.contains(&other_x.as_str()), CHECK, || {
        format!("unexpected ##contig=<ID={}> header", other_x)
    })?;
    if let Some(id) = contigs.iter().find(|id| is_chrom_23(id)) {
        return Err(HarnessError::mismatch(
            CHECK,
            format!("sex chromosome declared as ##contig=<ID={}>", id),
        ));
    }

    let last = vcf.data_lines().last().unwrap_or_default();
    let last_prefix = format!("{}\t", chr_x);
    require(last.starts_with(&last_prefix), CHECK, || {
        format!("last record should be on {}: {:?}", chr_x, last)
    })?;

    for line in vcf.data_lines() {
        require(!line.starts_with("23\t") && !line.starts_with("chr23\t"), CHECK, || {
            format!("record on chromosome 23: {:?}", line)
        })?;
        if naming == ChromNaming::Ucsc {
            require(line.starts_with("chr"), CHECK, || {
                format!("record without chr prefix: {:?}", line)
            })?;
        }
    }
    Ok(())
}

/// Either every chromosome token is `chr`-prefixed or none is, and 23 never
/// appears as a chromosome.
pub fn check_consistent_naming(vcf: &VcfText) -> Result<()> {
    const CHECK: &str = "consistent naming";

    let records = vcf.records()?;
    let tokens = vcf
        .contig_ids()
        .into_iter()
        .chain(records.iter().map(|r| r.chrom()));

    let mut styles: HashSet<ChromNaming> = HashSet::default();
    let mut first_of_style: Vec<&str> = Vec::new();
    for token in tokens {
        require(!is_chrom_23(token), CHECK, || {
            format!("chromosome 23 should be named X: {}", token)
        })?;
        if styles.insert(ChromNaming::of(token)) {
            first_of_style.push(token);
        }
    }

    require(styles.len() <= 1, CHECK, || {
        format!("mixed chr-prefixed and bare names: {}", first_of_style.join(" vs "))
    })
}

/// No record lies on an autosome the build does not have, the highest
/// autosome is present, and the output ends on X.
pub fn check_genome_build(vcf: &VcfText, build: GenomeBuild) -> Result<()> {
    const CHECK: &str = "genome build";

    let records = vcf.records()?;
    let Some(last) = records.last() else {
        return Err(HarnessError::mismatch(CHECK, "VCF has no records"));
    };
    let naming = ChromNaming::of(last.chrom());

    for record in &records {
        if let Some(n) = autosome_number(record.chrom()) {
            require(n <= build.max_autosome(), CHECK, || {
                format!(
                    "{} has {} autosomes but found a record on {}",
                    build,
                    build.max_autosome(),
                    record.chrom()
                )
            })?;
        }
    }

    let top = naming.format(&build.max_autosome().to_string());
    let present = records.iter().any(|r| r.chrom() == top) || vcf.contig_ids().contains(&top.as_str());
    require(present, CHECK, || format!("{} is missing for {}", top, build))?;

    let chr_x = naming.format("X");
    require(last.chrom() == chr_x, CHECK, || {
        format!("last record should be on {}: {:?}", chr_x, last.line())
    })
}

/// Every record carries `CNV_ANN`, neutral calls carry the placeholder, and
/// each expectation matches at least one record.
pub fn check_annotation(vcf: &VcfText, expectations: &[RecordExpectation]) -> Result<()> {
    const CHECK: &str = "annotation";

    for record in vcf.records()? {
        let Some(value) = record.info_value(ANNOTATION_KEY) else {
            return Err(HarnessError::mismatch(
                CHECK,
                format!("record without {}: {:?}", ANNOTATION_KEY, record.line()),
            ));
        };
        if record.info().contains(NEUTRAL_CALL) {
            require(value == NO_ANNOTATION, CHECK, || {
                format!(
                    "neutral record should carry {}={}: {:?}",
                    ANNOTATION_KEY,
                    NO_ANNOTATION,
                    record.line()
                )
            })?;
        }
    }

    for expectation in expectations {
        let matching: Vec<&str> = vcf
            .data_lines()
            .filter(|line| line.starts_with(&expectation.prefix))
            .collect();
        require(!matching.is_empty(), CHECK, || {
            format!("no record starts with {:?}", expectation.prefix)
        })?;
        for line in matching {
            require(line.contains(&expectation.contains), CHECK, || {
                format!("expected {:?} in {:?}", expectation.contains, line)
            })?;
        }
    }
    Ok(())
}

/// The decoded `CNV_ANN` names of every record equal the annotation entries
/// overlapping `POS..=END`. Neutral calls are never annotated.
pub fn check_annotation_against_bed(vcf: &VcfText, index: &AnnotationIndex) -> Result<()> {
    const CHECK: &str = "annotation overlap";

    for record in vcf.records()? {
        let observed = split_annotation(record.info_value(ANNOTATION_KEY).unwrap_or(NO_ANNOTATION));
        let expected = if record.info().contains(NEUTRAL_CALL) {
            Default::default()
        } else {
            index.expected_for(&record)
        };
        require(observed == expected, CHECK, || {
            format!(
                "{}:{}-{} annotated with {:?}, overlapping entries are {:?}",
                record.chrom(),
                record.pos(),
                record.end(),
                observed,
                expected
            )
        })?;
    }
    Ok(())
}
