use std::collections::HashSet;

use crate::domain::SampleRecord;

/// Merges records from all origins into one ordered, de-duplicated list
/// keyed by `sample`. First-seen wins: a later record with a duplicate key
/// never overwrites an earlier one, so the processing order (archive
/// accessions, then explicit pairs, then discovered pairs) decides which
/// record survives. An empty input is a valid "nothing to write" state.
pub fn reconcile(records: Vec<SampleRecord>) -> Vec<SampleRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.sample.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::domain::LibraryLayout;

    use super::*;

    fn record(sample: &str, sra: &str) -> SampleRecord {
        SampleRecord {
            sample: sample.to_string(),
            sra: sra.to_string(),
            fastq_1: String::new(),
            fastq_2: String::new(),
            organism: "unknown".to_string(),
            collection_date: String::new(),
            geo_location: String::new(),
            host: String::new(),
            isolation_source: String::new(),
            study_accession: String::new(),
            study_title: String::new(),
            read_count_raw: String::new(),
            library_layout: LibraryLayout::Single,
        }
    }

    #[test]
    fn duplicate_keys_keep_the_first_record() {
        let mut first = record("SRR1", "SRR1");
        first.organism = "Staphylococcus aureus".to_string();
        let resubmitted = record("SRR1", "SRR1");

        let merged = reconcile(vec![first.clone(), resubmitted, record("SRR2", "SRR2")]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], first);
        assert_eq!(merged[1].sample, "SRR2");
    }

    #[test]
    fn order_is_preserved() {
        let merged = reconcile(vec![
            record("SRR9", "SRR9"),
            record("SRR1", "SRR1"),
            record("local", ""),
        ]);
        let keys: Vec<&str> = merged.iter().map(|r| r.sample.as_str()).collect();
        assert_eq!(keys, vec!["SRR9", "SRR1", "local"]);
    }

    #[test]
    fn empty_input_is_valid() {
        assert!(reconcile(Vec::new()).is_empty());
    }
}
