use camino::{Utf8Path, Utf8PathBuf};

use crate::config::AttributeDefaults;
use crate::domain::{LibraryLayout, SampleRecord};
use crate::error::SheetError;
use crate::pairing;
use crate::sra::RawRunRecord;

/// Where a sample came from. Each variant is normalized by its own arm
/// rather than by inspecting which optional fields happen to be set.
#[derive(Debug, Clone)]
pub enum SampleOrigin {
    /// Extracted from the archive; the run accession doubles as the sample name.
    RemoteRun(RawRunRecord),
    /// R1/R2 paths supplied explicitly on the command line; paths must exist.
    ExplicitPair {
        r1: Utf8PathBuf,
        r2: Option<Utf8PathBuf>,
    },
    /// A pair produced by a directory scan; existence is guaranteed by the listing.
    DiscoveredPair { r1: Utf8PathBuf, r2: Utf8PathBuf },
}

/// Builds one canonical record regardless of origin.
pub fn normalize(
    origin: SampleOrigin,
    defaults: &AttributeDefaults,
) -> Result<SampleRecord, SheetError> {
    match origin {
        SampleOrigin::RemoteRun(run) => Ok(remote_record(run)),
        SampleOrigin::ExplicitPair { r1, r2 } => {
            require_exists(&r1)?;
            if let Some(r2) = &r2 {
                require_exists(r2)?;
            }
            local_record(&r1, r2.as_deref(), defaults)
        }
        SampleOrigin::DiscoveredPair { r1, r2 } => local_record(&r1, Some(&r2), defaults),
    }
}

fn remote_record(run: RawRunRecord) -> SampleRecord {
    SampleRecord {
        sample: run.run_accession.clone(),
        sra: run.run_accession,
        fastq_1: String::new(),
        fastq_2: String::new(),
        organism: run.organism,
        collection_date: run.collection_date,
        geo_location: run.geo_location,
        host: run.host,
        isolation_source: run.isolation_source,
        study_accession: run.study_accession,
        study_title: run.study_title,
        read_count_raw: run.read_count,
        library_layout: run.layout,
    }
}

fn local_record(
    r1: &Utf8Path,
    r2: Option<&Utf8Path>,
    defaults: &AttributeDefaults,
) -> Result<SampleRecord, SheetError> {
    let fastq_1 = absolute(r1)?;
    let fastq_2 = r2.map(absolute).transpose()?;

    Ok(SampleRecord {
        sample: pairing::sample_label(r1),
        sra: String::new(),
        fastq_1: fastq_1.into_string(),
        fastq_2: fastq_2.map(Utf8PathBuf::into_string).unwrap_or_default(),
        // No archive metadata exists for local files.
        organism: defaults.unknown_organism.clone(),
        collection_date: String::new(),
        geo_location: String::new(),
        host: String::new(),
        isolation_source: String::new(),
        study_accession: String::new(),
        study_title: String::new(),
        read_count_raw: String::new(),
        library_layout: if r2.is_some() {
            LibraryLayout::Paired
        } else {
            LibraryLayout::Single
        },
    })
}

fn require_exists(path: &Utf8Path) -> Result<(), SheetError> {
    if path.as_std_path().exists() {
        Ok(())
    } else {
        Err(SheetError::LocalPathNotFound(path.to_string()))
    }
}

fn absolute(path: &Utf8Path) -> Result<Utf8PathBuf, SheetError> {
    let absolute = std::path::absolute(path.as_std_path())
        .map_err(|err| SheetError::Filesystem(err.to_string()))?;
    Utf8PathBuf::from_path_buf(absolute)
        .map_err(|_| SheetError::Filesystem(format!("non-utf8 path: {path}")))
}
