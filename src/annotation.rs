use std::collections::BTreeSet;
use std::path::Path;

use ahash::HashMap;
use log::{debug, warn};
use noodles::bed;
use rust_lapper::{Interval, Lapper};

use crate::error::{HarnessError, Result};
use crate::genome::{ChromNaming, bare_chrom};
use crate::vcf::VcfRecord;

/// Placeholder the caller writes into `CNV_ANN` when nothing overlaps.
pub const NO_ANNOTATION: &str = ".";

pub type NameIv = Interval<usize, String>;

/// Annotation BED entries indexed per chromosome.
/// Intervals are stored 1-based with an exclusive stop, as `Lapper` expects.
pub struct AnnotationIndex {
    trees: HashMap<String, Lapper<usize, String>>,
}

impl AnnotationIndex {
    pub fn from_bed(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = std::fs::File::open(path).map_err(|source| HarnessError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let buf_reader = std::io::BufReader::new(reader);
        let mut bed_reader = bed::io::Reader::<4, _>::new(buf_reader);
        let mut record = bed::Record::default();
        let mut intervals: HashMap<String, Vec<NameIv>> = HashMap::default();

        let wrap = |source: std::io::Error| HarnessError::Decode {
            path: path.to_path_buf(),
            source,
        };

        while bed_reader.read_record(&mut record).map_err(wrap)? != 0 {
            let chrom = record.reference_sequence_name().to_string();
            let start = record.feature_start().map_err(wrap)?;
            let end = match record.feature_end() {
                Some(end) => end.map_err(wrap)?,
                None => return Err(HarnessError::decode(path, format!("missing end on {}", chrom))),
            };
            let name = match record.name() {
                Some(name) => name.to_string(),
                None => {
                    warn!("Unnamed annotation at {}:{}-{}", chrom, start, end);
                    NO_ANNOTATION.to_string()
                }
            };

            intervals.entry(chrom).or_default().push(NameIv {
                start: start.get(),
                stop: end.get() + 1,
                val: name,
            });
        }

        if intervals.is_empty() {
            return Err(HarnessError::decode(path, "annotation file has no entries"));
        }

        let trees: HashMap<String, Lapper<usize, String>> = intervals
            .into_iter()
            .map(|(chrom, ivs)| (chrom, Lapper::new(ivs)))
            .collect();

        debug!("Loaded annotation for {} chromosomes from {}", trees.len(), path.display());
        Ok(Self { trees })
    }

    fn tree_for(&self, chrom: &str) -> Option<&Lapper<usize, String>> {
        // The caller matches chromosomes regardless of naming convention.
        self.trees.get(chrom).or_else(|| {
            let bare = bare_chrom(chrom);
            let alternate = match ChromNaming::of(chrom) {
                ChromNaming::Ucsc => bare.to_string(),
                ChromNaming::Ensembl => ChromNaming::Ucsc.format(bare),
            };
            self.trees.get(&alternate)
        })
    }

    /// Names of entries overlapping the closed interval `[start, end]`.
    pub fn overlapping(&self, chrom: &str, start: u64, end: u64) -> BTreeSet<String> {
        match self.tree_for(chrom) {
            Some(tree) => tree
                .find(start as usize, end as usize + 1)
                .map(|iv| iv.val.clone())
                .collect(),
            None => BTreeSet::new(),
        }
    }

    /// Annotation set expected on a CNV record spanning `POS..=END`.
    pub fn expected_for(&self, record: &VcfRecord<'_>) -> BTreeSet<String> {
        self.overlapping(record.chrom(), record.pos(), record.end())
    }
}

/// Split a `CNV_ANN` value into decoded names. The placeholder yields none.
pub fn split_annotation(value: &str) -> BTreeSet<String> {
    if value == NO_ANNOTATION || value.is_empty() {
        return BTreeSet::new();
    }
    value.split(',').map(percent_decode).collect()
}

/// Decode `%XX` escapes. Malformed escapes are kept literally.
pub fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("00");
            decoded.push(u8::from_str_radix(hex, 16).unwrap_or(0));
            i += 3;
            continue;
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BED: &str = "chr1\t60000\t70000\tC\n\
chr1\t100000\t200000\tA\n\
chr1\t1000000\t2000000\tB\n\
chr1\t5000000\t5000100\tgene=b;Gene,Foo\n\
chrX\t10000\t20000\tD\n";

    fn index() -> (tempfile::TempDir, AnnotationIndex) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotation.bed");
        std::fs::write(&path, BED).unwrap();
        let index = AnnotationIndex::from_bed(&path).unwrap();
        (dir, index)
    }

    #[test]
    fn decodes_reserved_characters() {
        assert_eq!(percent_decode("gene%3Db%3BGene%2CFoo"), "gene=b;Gene,Foo");
        assert_eq!(percent_decode("plain"), "plain");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("bad%zzescape"), "bad%zzescape");
    }

    #[test]
    fn splits_annotation_values() {
        let names = split_annotation("C,A,B,gene%3Db%3BGene%2CFoo");
        let expected: BTreeSet<String> = ["A", "B", "C", "gene=b;Gene,Foo"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, expected);
        assert!(split_annotation(".").is_empty());
    }

    #[test]
    fn finds_every_overlapping_entry() {
        let (_dir, index) = index();
        let names = index.overlapping("chr1", 69424, 29651737);
        assert_eq!(names.len(), 4);
        assert!(names.contains("gene=b;Gene,Foo"));

        // BED starts are 0-based: the first base of C is 60001.
        assert!(index.overlapping("chr1", 59000, 60000).is_empty());
        assert_eq!(index.overlapping("chr1", 59000, 60001).len(), 1);
        assert!(index.overlapping("chr2", 1, 1_000_000).is_empty());
    }

    #[test]
    fn matches_across_naming_conventions() {
        let (_dir, index) = index();
        let names = index.overlapping("X", 15000, 15000);
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["D".to_string()]);
    }

    #[test]
    fn empty_bed_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bed");
        std::fs::write(&path, "").unwrap();
        assert!(AnnotationIndex::from_bed(&path).is_err());
    }
}
