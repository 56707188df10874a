use std::path::Path;

use crate::domain::{SampleRecord, SheetDelimiter};
use crate::error::SheetError;

/// Writes the samplesheet with a header row whose columns are exactly the
/// `SampleRecord` fields, one row per sample, in reconciliation order.
pub fn write_samplesheet(
    path: &Path,
    records: &[SampleRecord],
    delimiter: SheetDelimiter,
) -> Result<(), SheetError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .from_path(path)
        .map_err(|err| SheetError::SheetCsv(err.to_string()))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|err| SheetError::SheetCsv(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| SheetError::Filesystem(err.to_string()))?;
    Ok(())
}

pub fn read_samplesheet(
    path: &Path,
    delimiter: SheetDelimiter,
) -> Result<Vec<SampleRecord>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .from_path(path)
        .map_err(|err| SheetError::SheetCsv(err.to_string()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<SampleRecord>, _>>()
        .map_err(|err| SheetError::SheetCsv(err.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::domain::LibraryLayout;

    use super::*;

    fn records() -> Vec<SampleRecord> {
        vec![
            SampleRecord {
                sample: "SRR12142664".to_string(),
                sra: "SRR12142664".to_string(),
                fastq_1: String::new(),
                fastq_2: String::new(),
                organism: "Staphylococcus aureus".to_string(),
                collection_date: "2019-05-01".to_string(),
                geo_location: "USA: MN".to_string(),
                host: "Homo sapiens".to_string(),
                isolation_source: "not provided".to_string(),
                study_accession: "SRP036483".to_string(),
                study_title: "MRSA surveillance, phase 2".to_string(),
                read_count_raw: "1523412".to_string(),
                library_layout: LibraryLayout::Paired,
            },
            SampleRecord {
                sample: "sampleA".to_string(),
                sra: String::new(),
                fastq_1: "/data/sampleA_R1.fastq.gz".to_string(),
                fastq_2: "/data/sampleA_R2.fastq.gz".to_string(),
                organism: "unknown".to_string(),
                collection_date: String::new(),
                geo_location: String::new(),
                host: String::new(),
                isolation_source: String::new(),
                study_accession: String::new(),
                study_title: String::new(),
                read_count_raw: String::new(),
                library_layout: LibraryLayout::Paired,
            },
        ]
    }

    #[test]
    fn round_trip_preserves_records_and_order() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("samplesheet.csv");

        let original = records();
        write_samplesheet(&path, &original, SheetDelimiter::Comma).unwrap();
        let reread = read_samplesheet(&path, SheetDelimiter::Comma).unwrap();
        assert_eq!(reread, original);
    }

    #[test]
    fn round_trip_with_tab_delimiter() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("samplesheet.tsv");

        let original = records();
        write_samplesheet(&path, &original, SheetDelimiter::Tab).unwrap();
        let reread = read_samplesheet(&path, SheetDelimiter::Tab).unwrap();
        assert_eq!(reread, original);
    }

    #[test]
    fn header_row_lists_every_field() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("samplesheet.csv");
        write_samplesheet(&path, &records(), SheetDelimiter::Comma).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(
            header,
            "sample,sra,fastq_1,fastq_2,organism,collection_date,geo_location,host,\
             isolation_source,study_accession,study_title,read_count_raw,library_layout"
        );
    }

    #[test]
    fn layout_serializes_as_upper_case() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("samplesheet.csv");
        write_samplesheet(&path, &records(), SheetDelimiter::Comma).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("PAIRED"));
    }
}
