use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use flate2::read::MultiGzDecoder;
use log::debug;
use regex::Regex;

use crate::error::{HarnessError, Result};

static CONTIG_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##contig=<ID=([^,>]+)").expect("valid contig regex"));

/// A decompressed VCF held fully in memory, one entry per line without the
/// trailing newline. Kept as a whole rather than streamed: several checks look
/// at the last record or scan the text more than once.
#[derive(Debug, Clone, Default)]
pub struct VcfText {
    lines: Vec<String>,
}

impl VcfText {
    /// Read a gzip or BGZF compressed VCF. Every gzip member is decoded.
    pub fn from_gz_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| HarnessError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let vcf = Self::from_reader(BufReader::new(MultiGzDecoder::new(file))).map_err(|source| {
            HarnessError::Decode {
                path: path.to_path_buf(),
                source,
            }
        })?;

        debug!("Read {} lines from {}", vcf.lines.len(), path.display());
        Ok(vcf)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let lines = reader
            .lines()
            .map(|line| line.map(|l| l.trim_end_matches('\r').to_string()))
            .collect::<std::io::Result<Vec<String>>>()?;
        Ok(Self { lines })
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }

    pub fn header_lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str).filter(|l| l.starts_with('#'))
    }

    /// Body lines, skipping headers and blank lines.
    pub fn data_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.starts_with('#') && !l.is_empty())
    }

    pub fn records(&self) -> Result<Vec<VcfRecord<'_>>> {
        self.data_lines().map(VcfRecord::parse).collect()
    }

    pub fn last_record(&self) -> Result<Option<VcfRecord<'_>>> {
        self.data_lines().last().map(VcfRecord::parse).transpose()
    }

    /// IDs declared by `##contig=<ID=...>` header lines, in file order.
    pub fn contig_ids(&self) -> Vec<&str> {
        self.header_lines()
            .filter_map(|line| CONTIG_ID.captures(line))
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .collect()
    }
}

/// One tab-separated VCF body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VcfRecord<'a> {
    line: &'a str,
    chrom: &'a str,
    pos: u64,
    info: &'a str,
}

impl<'a> VcfRecord<'a> {
    pub fn parse(line: &'a str) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 8 {
            return Err(HarnessError::mismatch(
                "record shape",
                format!("expected at least 8 tab-separated columns, found {}: {:?}", fields.len(), line),
            ));
        }

        let pos = fields[1].parse::<u64>().map_err(|_| {
            HarnessError::mismatch("record shape", format!("POS is not a number: {:?}", line))
        })?;

        Ok(Self {
            line,
            chrom: fields[0],
            pos,
            info: fields[7],
        })
    }

    pub fn line(&self) -> &'a str {
        self.line
    }

    pub fn chrom(&self) -> &'a str {
        self.chrom
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn info(&self) -> &'a str {
        self.info
    }

    /// Value of an INFO key. Flags (keys without `=`) yield an empty string.
    pub fn info_value(&self, key: &str) -> Option<&'a str> {
        self.info.split(';').find_map(|field| match field.split_once('=') {
            Some((k, v)) if k == key => Some(v),
            None if field == key => Some(""),
            _ => None,
        })
    }

    /// `END` from INFO, or `POS` for single-position records.
    pub fn end(&self) -> u64 {
        self.info_value("END")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    const VCF: &str = "##fileformat=VCFv4.2\n\
##contig=<ID=chr1,length=248956422>\n\
##contig=<ID=chrX>\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
chr1\t69424\t.\tN\t<DUP>\t.\tPASS\tSVTYPE=DUP;END=29651737;IMPRECISE;CNV_ANN=A,B\n\
chrX\t500\t.\tN\t<DEL>\t.\tPASS\tSVTYPE=DEL;CNV_ANN=.\n";

    #[test]
    fn splits_headers_and_records() {
        let vcf = VcfText::from_text(VCF);
        assert_eq!(vcf.header_lines().count(), 4);
        assert_eq!(vcf.contig_ids(), vec!["chr1", "chrX"]);

        let records = vcf.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chrom(), "chr1");
        assert_eq!(records[0].pos(), 69424);
        assert_eq!(records[0].end(), 29651737);
        assert_eq!(records[0].info_value("CNV_ANN"), Some("A,B"));
        assert_eq!(records[0].info_value("IMPRECISE"), Some(""));
        assert_eq!(records[0].info_value("SVLEN"), None);

        let last = vcf.last_record().unwrap().unwrap();
        assert_eq!(last.chrom(), "chrX");
        assert_eq!(last.end(), 500);
    }

    #[test]
    fn short_record_is_rejected() {
        let err = VcfRecord::parse("chr1\t100\t.\tA").unwrap_err();
        assert!(err.to_string().contains("8 tab-separated columns"));
    }

    #[test]
    fn reads_concatenated_gzip_members() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.vcf.gz");

        let (head, body) = VCF.split_at(VCF.find("chr1\t69424").unwrap());
        let mut bytes = Vec::new();
        for part in [head, body] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(part.as_bytes()).unwrap();
            bytes.extend(encoder.finish().unwrap());
        }
        std::fs::write(&path, bytes).unwrap();

        let vcf = VcfText::from_gz_path(&path).unwrap();
        assert_eq!(vcf.lines().len(), 6);
        assert!(vcf.lines()[5].starts_with("chrX\t"));
    }

    #[test]
    fn plain_text_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.vcf.gz");
        std::fs::write(&path, VCF).unwrap();

        let err = VcfText::from_gz_path(&path).unwrap_err();
        assert!(matches!(err, HarnessError::Decode { .. }));
    }
}
