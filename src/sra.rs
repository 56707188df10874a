use std::collections::{HashMap, HashSet};

use roxmltree::{Document, Node};
use serde::Serialize;

use crate::config::AttributeDefaults;
use crate::domain::LibraryLayout;
use crate::error::SheetError;

/// Flat per-run metadata extracted from one efetch document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRunRecord {
    pub run_accession: String,
    pub organism: String,
    pub collection_date: String,
    pub geo_location: String,
    pub host: String,
    pub isolation_source: String,
    pub study_accession: String,
    pub study_title: String,
    pub read_count: String,
    pub layout: LibraryLayout,
}

type FieldExtractor = for<'a, 'input> fn(Node<'a, 'input>) -> Option<String>;

/// Fallback order for the organism name, tried on the SAMPLE entity.
const ORGANISM_CHAIN: [FieldExtractor; 2] = [taxon_scientific_name, scientific_name];

/// Fallback order for the raw read count, tried on the RUN entity.
const READ_COUNT_CHAIN: [FieldExtractor; 3] =
    [spot_count_attribute, spots_text, total_spots_attribute];

/// Parses an efetch `EXPERIMENT_PACKAGE_SET` document into one record per
/// RUN entry. A package may legitimately contain multiple runs; all are
/// emitted. Runs without an accession attribute are skipped.
pub fn parse_run_records(
    xml: &str,
    defaults: &AttributeDefaults,
) -> Result<Vec<RawRunRecord>, SheetError> {
    let doc =
        Document::parse(xml).map_err(|err| SheetError::MalformedDocument(err.to_string()))?;

    let mut records = Vec::new();
    for package in doc
        .descendants()
        .filter(|node| node.has_tag_name("EXPERIMENT_PACKAGE"))
    {
        let study = descendant(package, "STUDY");
        let study_accession = study
            .and_then(|node| node.attribute("accession"))
            .or_else(|| {
                descendant(package, "STUDY_REF").and_then(|node| node.attribute("accession"))
            })
            .unwrap_or_default()
            .to_string();
        let study_title = study
            .and_then(|node| descendant(node, "STUDY_TITLE"))
            .and_then(|node| node.text())
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        let sample = descendant(package, "SAMPLE");
        let organism = sample
            .and_then(|node| ORGANISM_CHAIN.iter().find_map(|extract| extract(node)))
            .unwrap_or_else(|| defaults.unknown_organism.clone());

        let attributes = sample.map(sample_attribute_map).unwrap_or_default();
        let attribute = |tag: &str| {
            attributes
                .get(tag)
                .cloned()
                .unwrap_or_else(|| defaults.missing_attribute.clone())
        };

        for run in package.descendants().filter(|node| node.has_tag_name("RUN")) {
            let Some(accession) = run.attribute("accession") else {
                continue;
            };
            let read_count = READ_COUNT_CHAIN
                .iter()
                .find_map(|extract| extract(run))
                .unwrap_or_else(|| "0".to_string());

            records.push(RawRunRecord {
                run_accession: accession.to_string(),
                organism: organism.clone(),
                collection_date: attribute("collection_date"),
                geo_location: attribute("geo_loc_name"),
                host: attribute("host"),
                isolation_source: attribute("isolation_source"),
                study_accession: study_accession.clone(),
                study_title: study_title.clone(),
                read_count,
                layout: run_layout(run, package),
            });
        }
    }

    Ok(records)
}

/// Keeps the first record per run accession, in resolution order. Querying
/// a study and one of its member runs in the same batch yields overlapping
/// accessions; the first occurrence wins.
pub fn dedup_by_run(records: Vec<RawRunRecord>) -> Vec<RawRunRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.run_accession.clone()))
        .collect()
}

/// The named low-depth filter behind `--curated`: drops records whose parsed
/// read count is positive but below `threshold`. Records with a zero,
/// missing, or unparseable count are kept.
pub fn filter_low_depth(records: Vec<RawRunRecord>, threshold: u64) -> Vec<RawRunRecord> {
    records
        .into_iter()
        .filter(|record| match record.read_count.parse::<u64>() {
            Ok(count) if count > 0 => count >= threshold,
            _ => true,
        })
        .collect()
}

fn descendant<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.descendants().find(|child| child.has_tag_name(tag))
}

fn child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn taxon_scientific_name(sample: Node<'_, '_>) -> Option<String> {
    descendant(sample, "SAMPLE_NAME")
        .and_then(|name| child_text(name, "TAXON_SCIENTIFIC_NAME"))
}

fn scientific_name(sample: Node<'_, '_>) -> Option<String> {
    descendant(sample, "SAMPLE_NAME").and_then(|name| child_text(name, "SCIENTIFIC_NAME"))
}

fn spot_count_attribute(run: Node<'_, '_>) -> Option<String> {
    descendant(run, "Statistics")
        .and_then(|stats| stats.attribute("nspots"))
        .map(str::to_string)
        .filter(|value| !value.is_empty())
}

fn spots_text(run: Node<'_, '_>) -> Option<String> {
    descendant(run, "Statistics").and_then(|stats| child_text(stats, "Spots"))
}

fn total_spots_attribute(run: Node<'_, '_>) -> Option<String> {
    run.attribute("total_spots")
        .map(str::to_string)
        .filter(|value| !value.is_empty())
}

/// Attribute tags are case-normalized before lookup: lower-cased, spaces
/// replaced with underscores.
fn sample_attribute_map(sample: Node<'_, '_>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for attr in sample
        .descendants()
        .filter(|node| node.has_tag_name("SAMPLE_ATTRIBUTE"))
    {
        let tag = child_text(attr, "TAG");
        let value = child_text(attr, "VALUE");
        if let (Some(tag), Some(value)) = (tag, value) {
            map.insert(normalize_tag(&tag), value);
        }
    }
    map
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase().replace(' ', "_")
}

/// PAIRED iff a `PAIRED` marker sits under a LIBRARY_LAYOUT descriptor:
/// the run's own descriptor when present, otherwise the package-level one.
fn run_layout(run: Node<'_, '_>, package: Node<'_, '_>) -> LibraryLayout {
    let descriptor = descendant(run, "LIBRARY_LAYOUT").or_else(|| {
        descendant(package, "LIBRARY_LAYOUT")
    });
    match descriptor {
        Some(node) if node.children().any(|child| child.has_tag_name("PAIRED")) => {
            LibraryLayout::Paired
        }
        _ => LibraryLayout::Single,
    }
}
