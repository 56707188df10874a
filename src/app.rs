use std::path::{Path, PathBuf};
use std::thread;

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;
use crate::domain::{SampleRecord, SheetDelimiter};
use crate::error::SheetError;
use crate::eutils::{EutilsClient, SRA_DB};
use crate::normalize::{self, SampleOrigin};
use crate::pairing;
use crate::reconcile;
use crate::sheet;
use crate::sra::{self, RawRunRecord};

#[derive(Debug, Clone)]
pub struct PrepareRequest {
    pub output: PathBuf,
    pub accessions: Vec<String>,
    /// Flat R1 R2 R1 R2 ... list; an odd length violates the caller contract.
    pub fastq_args: Vec<Utf8PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub delimiter: SheetDelimiter,
    pub curated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrepareOutcome {
    pub records: usize,
    /// None when there was nothing to write.
    pub written: Option<String>,
    pub warnings: Vec<String>,
    pub generated_at: String,
}

/// Outcome of one independent unit of work (one accession, one pair).
/// Failures are data, not control flow: they are aggregated into warnings
/// after the batch instead of aborting it.
enum UnitOutcome<T> {
    Contributed(T),
    Skipped(String),
}

pub struct App<E: EutilsClient> {
    eutils: E,
    settings: Settings,
}

impl<E: EutilsClient> App<E> {
    pub fn new(eutils: E, settings: Settings) -> Self {
        Self { eutils, settings }
    }

    /// Reconciles every requested source into one samplesheet. Processing
    /// order is archive accessions, then explicit pairs, then directory
    /// discoveries; the reconciler's first-seen-wins policy makes that
    /// order authoritative for duplicate sample names.
    pub fn prepare(&self, request: PrepareRequest) -> Result<PrepareOutcome, SheetError> {
        // Caller-contract violation: abort before any processing.
        if request.fastq_args.len() % 2 != 0 {
            return Err(SheetError::UnpairedFastqArgs(request.fastq_args.len()));
        }

        let mut warnings = Vec::new();
        let mut samples = Vec::new();

        let mut remote_runs = Vec::new();
        for accession in &request.accessions {
            match self.process_accession(accession) {
                UnitOutcome::Contributed(runs) => remote_runs.extend(runs),
                UnitOutcome::Skipped(reason) => warnings.push(reason),
            }
        }
        let remote_runs = sra::dedup_by_run(remote_runs);
        let remote_runs = if request.curated {
            sra::filter_low_depth(remote_runs, self.settings.min_read_count)
        } else {
            remote_runs
        };
        for run in remote_runs {
            match normalize::normalize(SampleOrigin::RemoteRun(run), &self.settings.defaults) {
                Ok(record) => samples.push(record),
                Err(err) => {
                    warn!(%err, "dropping archive record");
                    warnings.push(err.to_string());
                }
            }
        }

        for pair in request.fastq_args.chunks(2) {
            let origin = SampleOrigin::ExplicitPair {
                r1: pair[0].clone(),
                r2: pair.get(1).cloned(),
            };
            match normalize::normalize(origin, &self.settings.defaults) {
                Ok(record) => samples.push(record),
                Err(err) => {
                    warn!(%err, "skipping local pair");
                    warnings.push(err.to_string());
                }
            }
        }

        if let Some(dir) = &request.input_dir {
            match self.scan_directory(dir) {
                UnitOutcome::Contributed(records) => samples.extend(records),
                UnitOutcome::Skipped(reason) => warnings.push(reason),
            }
        }

        let samples = reconcile::reconcile(samples);
        let written = if samples.is_empty() {
            info!("no samples processed; samplesheet not created");
            None
        } else {
            sheet::write_samplesheet(&request.output, &samples, request.delimiter)?;
            info!(
                records = samples.len(),
                output = %request.output.display(),
                "samplesheet written"
            );
            Some(request.output.display().to_string())
        };

        Ok(PrepareOutcome {
            records: samples.len(),
            written,
            warnings,
            generated_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Resolves one accession to UIDs and extracts the run records behind
    /// each. Remote failures are converted to a skipped unit; a failed
    /// fetch for one UID does not abort the remaining UIDs.
    fn process_accession(&self, accession: &str) -> UnitOutcome<Vec<RawRunRecord>> {
        info!(%accession, "processing archive accession");
        let uids = match self
            .eutils
            .esearch(SRA_DB, accession, self.settings.retmax)
        {
            Ok(uids) => uids,
            Err(err) => {
                warn!(%accession, %err, "search failed; contributing no records");
                return UnitOutcome::Skipped(format!("{accession}: {err}"));
            }
        };
        if uids.is_empty() {
            warn!(%accession, "no archive match");
            return UnitOutcome::Skipped(format!("{accession}: no archive match"));
        }

        let mut runs = Vec::new();
        for uid in &uids {
            match self.fetch_runs(uid) {
                Ok(records) => runs.extend(records),
                Err(err) => warn!(%uid, %err, "skipping identifier"),
            }
            // Courtesy pause between successive E-utilities calls.
            thread::sleep(self.settings.fetch_delay);
        }
        UnitOutcome::Contributed(runs)
    }

    fn fetch_runs(&self, uid: &str) -> Result<Vec<RawRunRecord>, SheetError> {
        let xml = self.eutils.efetch(SRA_DB, uid)?;
        sra::parse_run_records(&xml, &self.settings.defaults)
    }

    fn scan_directory(&self, dir: &Path) -> UnitOutcome<Vec<SampleRecord>> {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "input directory does not exist");
            return UnitOutcome::Skipped(format!(
                "input directory does not exist: {}",
                dir.display()
            ));
        }

        info!(dir = %dir.display(), "scanning for FASTQ pairs");
        let files = pairing::collect_fastq_files(dir);
        let pairs = pairing::find_pairs(&files);
        if pairs.is_empty() {
            info!("no paired FASTQ files found in directory");
        }

        let mut records = Vec::new();
        for (r1, r2) in pairs {
            let Some(r2) = r2 else {
                continue;
            };
            info!(r1 = %r1, r2 = %r2, "found pair");
            match normalize::normalize(
                SampleOrigin::DiscoveredPair { r1, r2 },
                &self.settings.defaults,
            ) {
                Ok(record) => records.push(record),
                Err(err) => warn!(%err, "skipping discovered pair"),
            }
        }
        UnitOutcome::Contributed(records)
    }
}
