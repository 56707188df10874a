use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SheetError {
    #[error("E-utilities request failed: {0}")]
    EutilsHttp(String),

    #[error("E-utilities returned status {status}: {message}")]
    EutilsStatus { status: u16, message: String },

    #[error("malformed archive document: {0}")]
    MalformedDocument(String),

    #[error("local FASTQ not found: {0}")]
    LocalPathNotFound(String),

    #[error("local FASTQ files must be given as R1 R2 pairs (got {0} paths)")]
    UnpairedFastqArgs(usize),

    #[error("results table is missing required column: {0}")]
    MissingColumn(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("samplesheet I/O failed: {0}")]
    SheetCsv(String),

    #[error("render failed: {0}")]
    Render(String),
}
