use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{HarnessError, Result};

/// Output files the caller writes next to its `-o` prefix.
#[derive(Debug, Clone)]
pub struct OutputArtifacts {
    prefix: PathBuf,
    with_csv: bool,
}

impl OutputArtifacts {
    /// `with_csv` is set when the run started from BAM files, in which case
    /// the intermediate pileup is kept as `<prefix>.csv.gz`.
    pub fn from_prefix(prefix: impl Into<PathBuf>, with_csv: bool) -> Self {
        OutputArtifacts {
            prefix: prefix.into(),
            with_csv,
        }
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        // Appended rather than set as extension: prefixes may contain dots.
        let mut name = OsString::from(self.prefix.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn vcf(&self) -> PathBuf {
        self.with_suffix(".vcf.gz")
    }

    pub fn cnv_plot(&self) -> PathBuf {
        self.with_suffix(".cnv.png")
    }

    pub fn spider_plot(&self) -> PathBuf {
        self.with_suffix(".spider.pdf")
    }

    pub fn pileup_csv(&self) -> Option<PathBuf> {
        self.with_csv.then(|| self.with_suffix(".csv.gz"))
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.vcf(), self.cnv_plot(), self.spider_plot()];
        paths.extend(self.pileup_csv());
        paths
    }

    /// Check every expected file exists, reporting all missing ones at once.
    pub fn verify(&self) -> Result<()> {
        let missing: Vec<PathBuf> = self
            .paths()
            .into_iter()
            .filter(|path| {
                let exists = path.is_file();
                debug!("{}: {}", path.display(), if exists { "present" } else { "missing" });
                !exists
            })
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::MissingArtifact { missing })
        }
    }
}
