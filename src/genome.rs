use std::fmt::Display;
use std::str::FromStr;

/// Genome builds the caller understands through `-g`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenomeBuild {
    Hg18,
    Hg19,
    #[default]
    Hg38,
    Mm9,
    Mm10,
}

impl GenomeBuild {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenomeBuild::Hg18 => "hg18",
            GenomeBuild::Hg19 => "hg19",
            GenomeBuild::Hg38 => "hg38",
            GenomeBuild::Mm9 => "mm9",
            GenomeBuild::Mm10 => "mm10",
        }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, GenomeBuild::Hg18 | GenomeBuild::Hg19 | GenomeBuild::Hg38)
    }

    /// Highest numbered autosome of the build.
    pub fn max_autosome(&self) -> u32 {
        if self.is_human() { 22 } else { 19 }
    }
}

impl Display for GenomeBuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenomeBuild {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hg18" => Ok(GenomeBuild::Hg18),
            "hg19" | "grch37" => Ok(GenomeBuild::Hg19),
            "hg38" | "grch38" => Ok(GenomeBuild::Hg38),
            "mm9" => Ok(GenomeBuild::Mm9),
            "mm10" | "grcm38" => Ok(GenomeBuild::Mm10),
            _ => Err(format!("Unknown genome build: {}", s)),
        }
    }
}

/// Chromosome naming convention of a VCF.
/// UCSC names carry a `chr` prefix (`chr1`, `chrX`), Ensembl names do not (`1`, `X`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChromNaming {
    Ucsc,
    Ensembl,
}

impl ChromNaming {
    pub fn of(token: &str) -> Self {
        if token.starts_with("chr") {
            ChromNaming::Ucsc
        } else {
            ChromNaming::Ensembl
        }
    }

    /// Render a bare chromosome name (`1`, `X`) in this convention.
    pub fn format(&self, name: &str) -> String {
        match self {
            ChromNaming::Ucsc => format!("chr{}", name),
            ChromNaming::Ensembl => name.to_string(),
        }
    }

    pub fn other(&self) -> Self {
        match self {
            ChromNaming::Ucsc => ChromNaming::Ensembl,
            ChromNaming::Ensembl => ChromNaming::Ucsc,
        }
    }
}

impl Display for ChromNaming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChromNaming::Ucsc => f.write_str("ucsc"),
            ChromNaming::Ensembl => f.write_str("ensembl"),
        }
    }
}

/// Strip the `chr` prefix, if any.
pub fn bare_chrom(token: &str) -> &str {
    token.strip_prefix("chr").unwrap_or(token)
}

/// Numeric value of an autosome token, `None` for sex chromosomes and scaffolds.
pub fn autosome_number(token: &str) -> Option<u32> {
    bare_chrom(token).parse::<u32>().ok()
}
