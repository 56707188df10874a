use std::fs;

use camino::Utf8Path;

use seqsheet::pairing::{collect_fastq_files, find_pairs, sample_label};

#[test]
fn scan_collects_recursively_and_pairs() {
    let temp = tempfile::tempdir().unwrap();
    let nested = temp.path().join("runs/batch1");
    fs::create_dir_all(&nested).unwrap();

    for name in [
        "sampleA_R1.fastq.gz",
        "sampleA_R2.fastq.gz",
        "lone_R1.fastq.gz",
        "notes.txt",
    ] {
        fs::write(nested.join(name), b"x").unwrap();
    }

    let files = collect_fastq_files(temp.path());
    assert_eq!(files.len(), 3);

    let pairs = find_pairs(&files);
    assert_eq!(pairs.len(), 1);
    let (r1, r2) = &pairs[0];
    assert!(r1.as_str().ends_with("sampleA_R1.fastq.gz"));
    assert!(
        r2.as_deref()
            .map(|p| p.as_str().ends_with("sampleA_R2.fastq.gz"))
            .unwrap_or(false)
    );
    assert_eq!(sample_label(r1), "sampleA");
}

#[test]
fn scan_of_empty_directory_finds_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let files = collect_fastq_files(temp.path());
    assert!(files.is_empty());
    assert!(find_pairs(&files).is_empty());
}

#[test]
fn rule_order_prefers_r1_marker() {
    let temp = tempfile::tempdir().unwrap();
    for name in ["x_R1_001.fastq.gz", "x_R2_001.fastq.gz", "x_1.fastq.gz"] {
        fs::write(temp.path().join(name), b"x").unwrap();
    }

    let files = collect_fastq_files(temp.path());
    let pairs = find_pairs(&files);
    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].0.as_str().ends_with("x_R1_001.fastq.gz"));
    assert_eq!(sample_label(Utf8Path::new("x_R1_001.fastq.gz")), "x");
}
