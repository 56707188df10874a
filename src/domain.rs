use std::fmt;

use camino::Utf8PathBuf;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Sequencing layout of one run, as declared by the archive or implied by
/// the presence of a second local read file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LibraryLayout {
    Paired,
    Single,
}

impl fmt::Display for LibraryLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryLayout::Paired => write!(f, "PAIRED"),
            LibraryLayout::Single => write!(f, "SINGLE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SheetDelimiter {
    Comma,
    Tab,
}

impl SheetDelimiter {
    pub fn as_byte(&self) -> u8 {
        match self {
            SheetDelimiter::Comma => b',',
            SheetDelimiter::Tab => b'\t',
        }
    }
}

impl fmt::Display for SheetDelimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetDelimiter::Comma => write!(f, "comma"),
            SheetDelimiter::Tab => write!(f, "tab"),
        }
    }
}

/// A mate-pair candidate produced by the pairing matcher: the R1 path and,
/// when a mate was found in the scanned set, the R2 path.
pub type FilePairCandidate = (Utf8PathBuf, Option<Utf8PathBuf>);

/// One row of the output samplesheet. Field order is the column order.
///
/// A record originates from exactly one source: either `sra` is a run
/// accession and the fastq paths are empty, or `fastq_1` is a local path and
/// `sra` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub sample: String,
    pub sra: String,
    pub fastq_1: String,
    pub fastq_2: String,
    pub organism: String,
    pub collection_date: String,
    pub geo_location: String,
    pub host: String,
    pub isolation_source: String,
    pub study_accession: String,
    pub study_title: String,
    pub read_count_raw: String,
    pub library_layout: LibraryLayout,
}

impl SampleRecord {
    /// True when the record has exactly one origin (archive or filesystem)
    /// and its layout agrees with the mate evidence it carries.
    pub fn is_well_formed(&self) -> bool {
        let single_origin = self.sra.is_empty() != self.fastq_1.is_empty();
        let layout_ok = if !self.fastq_1.is_empty() {
            (self.library_layout == LibraryLayout::Paired) == !self.fastq_2.is_empty()
        } else {
            self.fastq_2.is_empty()
        };
        !self.sample.is_empty() && single_origin && layout_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_record() -> SampleRecord {
        SampleRecord {
            sample: "SRR12142664".to_string(),
            sra: "SRR12142664".to_string(),
            fastq_1: String::new(),
            fastq_2: String::new(),
            organism: "Staphylococcus aureus".to_string(),
            collection_date: "2019-05-01".to_string(),
            geo_location: "USA".to_string(),
            host: "Homo sapiens".to_string(),
            isolation_source: "blood".to_string(),
            study_accession: "SRP036483".to_string(),
            study_title: "MRSA surveillance".to_string(),
            read_count_raw: "1523412".to_string(),
            library_layout: LibraryLayout::Paired,
        }
    }

    #[test]
    fn layout_display_matches_sheet_values() {
        assert_eq!(LibraryLayout::Paired.to_string(), "PAIRED");
        assert_eq!(LibraryLayout::Single.to_string(), "SINGLE");
    }

    #[test]
    fn well_formed_accepts_remote_record() {
        assert!(remote_record().is_well_formed());
    }

    #[test]
    fn well_formed_rejects_dual_origin() {
        let mut record = remote_record();
        record.fastq_1 = "/data/a_R1.fastq.gz".to_string();
        assert!(!record.is_well_formed());
    }

    #[test]
    fn well_formed_rejects_paired_without_mate() {
        let mut record = remote_record();
        record.sra = String::new();
        record.fastq_1 = "/data/a_R1.fastq.gz".to_string();
        assert!(!record.is_well_formed());
        record.fastq_2 = "/data/a_R2.fastq.gz".to_string();
        assert!(record.is_well_formed());
    }
}
