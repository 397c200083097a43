#![allow(dead_code)]

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

pub const FIXTURES: [&str; 5] = ["ensembl", "ucsc", "mm10", "annotated", "mixed"];

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn test_data_dir() -> PathBuf {
    workspace_root().join("test/data")
}

pub fn gzip_to(src: &Path, dest: &Path) {
    let text = std::fs::read(src).expect("fixture readable");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&text).unwrap();
    std::fs::write(dest, encoder.finish().unwrap()).unwrap();
}

/// Compressed copy of a VCF fixture, named `<fixture>.vcf.gz` inside `dir`.
pub fn compressed_fixture(dir: &Path, fixture: &str) -> PathBuf {
    let dest = dir.join(format!("{}.vcf.gz", fixture));
    gzip_to(&test_data_dir().join(format!("{}.vcf", fixture)), &dest);
    dest
}

/// A fake caller installed in its own temp dir, with compressed fixtures
/// next to it.
pub struct FakeCaller {
    pub dir: assert_fs::TempDir,
    pub executable: PathBuf,
}

/// Modes: `ok`, `fail`, `hang`, `no_plots`, `mixed`.
pub fn install_fake_caller(mode: &str) -> FakeCaller {
    let dir = assert_fs::TempDir::new().unwrap();

    for fixture in FIXTURES {
        compressed_fixture(dir.path(), fixture);
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(b"Chromosome,Position,Ref,Alt,File1R,File1A,File2R,File2A\n")
        .unwrap();
    std::fs::write(dir.path().join("pileup.csv.gz"), encoder.finish().unwrap()).unwrap();

    let template = std::fs::read_to_string(test_data_dir().join("fake_cnv_facets.sh"))
        .expect("fake caller template");
    let script = template
        .replace("__FIXTURES__", &dir.path().display().to_string())
        .replace("__MODE__", mode);

    let executable = dir.path().join("cnv_facets.R");
    std::fs::write(&executable, script).unwrap();
    std::fs::set_permissions(&executable, std::fs::Permissions::from_mode(0o755)).unwrap();

    FakeCaller { dir, executable }
}

impl FakeCaller {
    /// Output prefixes passed via `-o`, one per invocation.
    pub fn recorded_outputs(&self) -> Vec<PathBuf> {
        std::fs::read_to_string(self.dir.path().join("outputs"))
            .unwrap_or_default()
            .lines()
            .map(PathBuf::from)
            .collect()
    }
}

pub fn read_report(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path).expect("report written");
    serde_json::from_str(&text).expect("report is JSON")
}
