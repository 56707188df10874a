use std::collections::HashSet;
use std::fs;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;

use crate::domain::FilePairCandidate;

/// One mate-marker convention: the pattern identifying an R1-side filename
/// and the verbatim marker substitution producing its mate.
struct MateRule {
    r1_pattern: Regex,
    r1_marker: &'static str,
    r2_marker: &'static str,
}

/// Rules are tried in listed order; `_R1` outranks `_1` when a filename
/// could satisfy both.
fn mate_rules() -> Vec<MateRule> {
    vec![
        MateRule {
            r1_pattern: Regex::new(r"(?i)_R1(_001)?\.(fastq|fq)(\.gz)?$").unwrap(),
            r1_marker: "_R1",
            r2_marker: "_R2",
        },
        MateRule {
            r1_pattern: Regex::new(r"(?i)_1(_001)?\.(fastq|fq)(\.gz)?$").unwrap(),
            r1_marker: "_1",
            r2_marker: "_2",
        },
    ]
}

/// Recursively collects raw-read files (`.fastq`/`.fq`, optionally
/// gzip-suffixed, case-insensitive) under `root`, sorted lexicographically.
/// Unreadable subdirectories and non-UTF-8 paths are skipped.
pub fn collect_fastq_files(root: &Path) -> Vec<Utf8PathBuf> {
    let extension = Regex::new(r"(?i)\.(fastq|fq)(\.gz)?$").unwrap();
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        if let Ok(entries) = fs::read_dir(&dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }
                let Ok(path) = Utf8PathBuf::from_path_buf(path) else {
                    tracing::debug!(path = %entry.path().display(), "skipping non-utf8 path");
                    continue;
                };
                if extension.is_match(path.as_str()) {
                    out.push(path);
                }
            }
        }
    }
    out.sort();
    out
}

/// Groups a scanned file set into mate pairs.
///
/// Paths are visited in lexicographic order. For each unconsumed path the
/// mate rules are tried in order; the first rule whose R1 pattern matches
/// claims the path. The candidate mate is the first-occurrence substitution
/// of the R1 marker and is accepted only when it is itself a member of the
/// scanned set. Files matching no rule, and R1 files whose mate is absent,
/// yield no pair — single-end files discovered by a scan are dropped, a
/// known limitation of the scan path.
pub fn find_pairs(files: &[Utf8PathBuf]) -> Vec<FilePairCandidate> {
    let rules = mate_rules();
    let members: HashSet<&str> = files.iter().map(|p| p.as_str()).collect();

    let mut sorted: Vec<&Utf8PathBuf> = files.iter().collect();
    sorted.sort();

    let mut consumed: HashSet<String> = HashSet::new();
    let mut pairs = Vec::new();

    for path in sorted {
        if consumed.contains(path.as_str()) {
            continue;
        }
        for rule in &rules {
            if !rule.r1_pattern.is_match(path.as_str()) {
                continue;
            }
            let mate = path.as_str().replacen(rule.r1_marker, rule.r2_marker, 1);
            if members.contains(mate.as_str()) && !consumed.contains(mate.as_str()) {
                consumed.insert(path.as_str().to_string());
                consumed.insert(mate.clone());
                pairs.push((path.clone(), Some(Utf8PathBuf::from(mate))));
            } else {
                tracing::debug!(path = %path, "R1 candidate has no mate in the scanned set");
            }
            break;
        }
    }

    pairs
}

/// Derives the sample name from an R1 filename: strips, once and
/// case-insensitively, an optional `_R1`/`_1` marker, an optional `_001`
/// segment, and the raw-read extension with optional compression suffix.
pub fn sample_label(r1: &Utf8Path) -> String {
    let stripper = Regex::new(r"(?i)(_R1|_1)?(_001)?(\.fastq|\.fq)?(\.gz)?$").unwrap();
    let name = r1.file_name().unwrap_or_default();
    stripper.replace(name, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<Utf8PathBuf> {
        names.iter().map(Utf8PathBuf::from).collect()
    }

    #[test]
    fn pairs_r1_r2_convention() {
        let files = paths(&["data/sampleA_R1.fastq.gz", "data/sampleA_R2.fastq.gz"]);
        let pairs = find_pairs(&files);
        assert_eq!(
            pairs,
            vec![(
                Utf8PathBuf::from("data/sampleA_R1.fastq.gz"),
                Some(Utf8PathBuf::from("data/sampleA_R2.fastq.gz")),
            )]
        );
    }

    #[test]
    fn pairs_numeric_convention_with_lane_segment() {
        let files = paths(&["x_1_001.fq", "x_2_001.fq"]);
        let pairs = find_pairs(&files);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "x_1_001.fq");
        assert_eq!(pairs[0].1.as_deref(), Some(Utf8Path::new("x_2_001.fq")));
    }

    #[test]
    fn r1_rule_outranks_numeric_rule() {
        // x_R1_001 pairs under the _R1 rule; x_1 finds no x_2 and is dropped.
        let files = paths(&["x_R1_001.fastq.gz", "x_R2_001.fastq.gz", "x_1.fastq.gz"]);
        let pairs = find_pairs(&files);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "x_R1_001.fastq.gz");
        assert_eq!(
            pairs[0].1.as_deref(),
            Some(Utf8Path::new("x_R2_001.fastq.gz"))
        );
    }

    #[test]
    fn lone_r1_yields_no_pair() {
        let files = paths(&["lone_R1.fastq.gz", "other.fastq"]);
        assert!(find_pairs(&files).is_empty());
    }

    #[test]
    fn mate_must_be_in_the_scanned_set() {
        // The mate may exist on disk, but only set membership counts.
        let files = paths(&["a_R1.fastq"]);
        assert!(find_pairs(&files).is_empty());
    }

    #[test]
    fn pair_order_is_first_encountered() {
        let files = paths(&[
            "b_R1.fastq",
            "b_R2.fastq",
            "a_R1.fastq",
            "a_R2.fastq",
        ]);
        let pairs = find_pairs(&files);
        assert_eq!(pairs[0].0, "a_R1.fastq");
        assert_eq!(pairs[1].0, "b_R1.fastq");
    }

    #[test]
    fn case_insensitive_extensions() {
        let files = paths(&["s_R1.FASTQ.GZ", "s_R2.FASTQ.GZ"]);
        assert_eq!(find_pairs(&files).len(), 1);
    }

    #[test]
    fn label_strips_marker_segment_and_extension() {
        assert_eq!(sample_label(Utf8Path::new("data/sampleA_R1.fastq.gz")), "sampleA");
        assert_eq!(sample_label(Utf8Path::new("x_R1_001.fastq.gz")), "x");
        assert_eq!(sample_label(Utf8Path::new("y_1.fq")), "y");
        assert_eq!(sample_label(Utf8Path::new("plain.fastq")), "plain");
        assert_eq!(sample_label(Utf8Path::new("UPPER_R1.FQ.GZ")), "UPPER");
    }
}
