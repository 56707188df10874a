use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use serde::Serialize;

use crate::error::SheetError;

const CELL: u32 = 16;
const BAR_PLOT_HEIGHT: u32 = 160;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([224, 224, 224]);
const AMR_FILL: Rgb<u8> = Rgb([43, 87, 154]);
const VIRULENCE_FILL: Rgb<u8> = Rgb([165, 28, 48]);
const BAR_FILL: Rgb<u8> = Rgb([70, 116, 193]);

/// An analysis-results table. Comma-delimited, or tab-delimited when the
/// file ends in `.tsv`.
pub struct ResultsTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultsTable {
    pub fn from_path(path: &Path) -> Result<Self, SheetError> {
        let delimiter = if path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("tsv"))
            .unwrap_or(false)
        {
            b'\t'
        } else {
            b','
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)
            .map_err(|err| SheetError::SheetCsv(err.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|err| SheetError::SheetCsv(err.to_string()))?
            .iter()
            .map(|header| header.trim().to_string())
            .collect();
        let rows = reader
            .records()
            .map(|record| {
                record.map(|fields| fields.iter().map(str::to_string).collect::<Vec<_>>())
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| SheetError::SheetCsv(err.to_string()))?;

        Ok(Self { headers, rows })
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
    }

    fn cell<'a>(&self, row: &'a [String], column: usize) -> &'a str {
        row.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Binary presence/absence of genes per sample, rows in table order,
/// columns sorted by gene name.
pub struct PresenceMatrix {
    pub samples: Vec<String>,
    pub genes: Vec<String>,
    pub cells: Vec<Vec<bool>>,
}

/// Expands a semicolon-delimited gene-list column into a presence matrix.
pub fn presence_matrix(
    table: &ResultsTable,
    sample_column: usize,
    gene_column: usize,
) -> PresenceMatrix {
    let mut gene_set = BTreeSet::new();
    for row in &table.rows {
        for gene in split_genes(table.cell(row, gene_column)) {
            gene_set.insert(gene.to_string());
        }
    }
    let genes: Vec<String> = gene_set.into_iter().collect();

    let mut samples = Vec::new();
    let mut cells = Vec::new();
    for row in &table.rows {
        let present: BTreeSet<&str> = split_genes(table.cell(row, gene_column)).collect();
        samples.push(table.cell(row, sample_column).to_string());
        cells.push(genes.iter().map(|gene| present.contains(gene.as_str())).collect());
    }

    PresenceMatrix {
        samples,
        genes,
        cells,
    }
}

fn split_genes(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(';')
        .map(str::trim)
        .filter(|gene| !gene.is_empty())
}

/// Renders the matrix as a cell grid, one block per sample/gene cell.
/// Labels are intentionally absent; the sidecar CSV carries them.
pub fn render_heatmap(
    matrix: &PresenceMatrix,
    fill: Rgb<u8>,
    path: &Path,
) -> Result<(), SheetError> {
    let width = matrix.genes.len() as u32 * CELL;
    let height = matrix.samples.len() as u32 * CELL;
    let mut canvas = RgbImage::from_pixel(width.max(CELL), height.max(CELL), GRID);

    for (row, sample_cells) in matrix.cells.iter().enumerate() {
        for (column, present) in sample_cells.iter().enumerate() {
            let color = if *present { fill } else { BACKGROUND };
            fill_cell(&mut canvas, column as u32 * CELL, row as u32 * CELL, color);
        }
    }

    canvas
        .save(path)
        .map_err(|err| SheetError::Render(err.to_string()))
}

/// Renders category counts as a vertical bar per category, left to right
/// in the given order, heights scaled to the largest count.
pub fn render_count_bars(counts: &[(String, usize)], path: &Path) -> Result<(), SheetError> {
    let max = counts.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let width = (counts.len() as u32 * CELL).max(CELL);
    let mut canvas = RgbImage::from_pixel(width, BAR_PLOT_HEIGHT, BACKGROUND);

    if max > 0 {
        for (index, (_, count)) in counts.iter().enumerate() {
            let bar = (*count as u32 * (BAR_PLOT_HEIGHT - 2)) / max as u32;
            let x0 = index as u32 * CELL;
            for x in x0..(x0 + CELL - 1) {
                for y in (BAR_PLOT_HEIGHT - bar)..BAR_PLOT_HEIGHT {
                    canvas.put_pixel(x, y, BAR_FILL);
                }
            }
        }
    }

    canvas
        .save(path)
        .map_err(|err| SheetError::Render(err.to_string()))
}

fn fill_cell(canvas: &mut RgbImage, x0: u32, y0: u32, color: Rgb<u8>) {
    // Leave a 1px grid line on the right and bottom edges of each cell.
    for x in x0..(x0 + CELL - 1) {
        for y in y0..(y0 + CELL - 1) {
            canvas.put_pixel(x, y, color);
        }
    }
}

fn write_matrix_csv(matrix: &PresenceMatrix, path: &Path) -> Result<(), SheetError> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|err| SheetError::SheetCsv(err.to_string()))?;
    let mut header = vec!["sample_id".to_string()];
    header.extend(matrix.genes.iter().cloned());
    writer
        .write_record(&header)
        .map_err(|err| SheetError::SheetCsv(err.to_string()))?;
    for (sample, cells) in matrix.samples.iter().zip(&matrix.cells) {
        let mut row = vec![sample.clone()];
        row.extend(
            cells
                .iter()
                .map(|present| (if *present { "1" } else { "0" }).to_string()),
        );
        writer
            .write_record(&row)
            .map_err(|err| SheetError::SheetCsv(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| SheetError::Filesystem(err.to_string()))
}

fn write_counts_csv(counts: &[(String, usize)], path: &Path) -> Result<(), SheetError> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|err| SheetError::SheetCsv(err.to_string()))?;
    writer
        .write_record(["sequence_type", "count"])
        .map_err(|err| SheetError::SheetCsv(err.to_string()))?;
    for (category, count) in counts {
        writer
            .write_record([category.as_str(), &count.to_string()])
            .map_err(|err| SheetError::SheetCsv(err.to_string()))?;
    }
    writer
        .flush()
        .map_err(|err| SheetError::Filesystem(err.to_string()))
}

#[derive(Debug, Clone, Serialize)]
pub struct VizOutcome {
    pub images: Vec<String>,
}

/// Renders every visualization the results table supports: a sequence-type
/// distribution when `mlst_sequence_type` is present, and presence/absence
/// heatmaps for `amrfinder_genes` and `virulence_genes`. Each image gets a
/// sidecar CSV carrying the row/column labels in render order. A missing
/// optional column skips that rendering; a missing sample key is an error.
pub fn visualize(results: &Path, out_dir: &Path) -> Result<VizOutcome, SheetError> {
    fs::create_dir_all(out_dir).map_err(|err| SheetError::Filesystem(err.to_string()))?;

    let table = ResultsTable::from_path(results)?;
    let sample_column = table
        .column("sample_id")
        .or_else(|| table.column("sample"))
        .ok_or_else(|| SheetError::MissingColumn("sample_id".to_string()))?;

    let mut images = Vec::new();

    if let Some(st_column) = table.column("mlst_sequence_type") {
        let mut counts = BTreeMap::new();
        for row in &table.rows {
            let value = table.cell(row, st_column).trim();
            if !value.is_empty() {
                *counts.entry(value.to_string()).or_insert(0usize) += 1;
            }
        }
        if !counts.is_empty() {
            let counts: Vec<(String, usize)> = counts.into_iter().collect();
            let png = out_dir.join("mlst_distribution.png");
            render_count_bars(&counts, &png)?;
            write_counts_csv(&counts, &out_dir.join("mlst_distribution.csv"))?;
            images.push(png.display().to_string());
        }
    }

    for (column_name, stem, fill) in [
        ("amrfinder_genes", "amr_heatmap", AMR_FILL),
        ("virulence_genes", "virulence_heatmap", VIRULENCE_FILL),
    ] {
        let Some(gene_column) = table.column(column_name) else {
            continue;
        };
        let matrix = presence_matrix(&table, sample_column, gene_column);
        if matrix.genes.is_empty() {
            continue;
        }
        let png = out_dir.join(format!("{stem}.png"));
        render_heatmap(&matrix, fill, &png)?;
        write_matrix_csv(&matrix, &out_dir.join(format!("{stem}.csv")))?;
        images.push(png.display().to_string());
    }

    Ok(VizOutcome { images })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn write_results(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn presence_matrix_expands_gene_lists() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_results(
            temp.path(),
            "results.csv",
            "sample_id,amrfinder_genes\nS1,mecA;blaZ\nS2,blaZ\nS3,\n",
        );
        let table = ResultsTable::from_path(&path).unwrap();
        let matrix = presence_matrix(&table, 0, 1);

        assert_eq!(matrix.genes, vec!["blaZ", "mecA"]);
        assert_eq!(matrix.samples, vec!["S1", "S2", "S3"]);
        assert_eq!(matrix.cells[0], vec![true, true]);
        assert_eq!(matrix.cells[1], vec![true, false]);
        assert_eq!(matrix.cells[2], vec![false, false]);
    }

    #[test]
    fn tsv_extension_switches_delimiter() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_results(
            temp.path(),
            "results.tsv",
            "sample_id\tmlst_sequence_type\nS1\tST8\n",
        );
        let table = ResultsTable::from_path(&path).unwrap();
        assert_eq!(table.column("mlst_sequence_type"), Some(1));
    }

    #[test]
    fn visualize_writes_images_and_sidecars() {
        let temp = tempfile::tempdir().unwrap();
        let results = write_results(
            temp.path(),
            "results.csv",
            "sample_id,mlst_sequence_type,amrfinder_genes,virulence_genes\n\
             S1,ST8,mecA;blaZ,lukF-PV\n\
             S2,ST8,blaZ,\n\
             S3,ST22,,lukS-PV;lukF-PV\n",
        );
        let out_dir = temp.path().join("plots");

        let outcome = visualize(&results, &out_dir).unwrap();
        assert_eq!(outcome.images.len(), 3);
        assert!(out_dir.join("mlst_distribution.png").exists());
        assert!(out_dir.join("mlst_distribution.csv").exists());
        assert!(out_dir.join("amr_heatmap.png").exists());
        assert!(out_dir.join("amr_heatmap.csv").exists());
        assert!(out_dir.join("virulence_heatmap.png").exists());

        let sidecar = fs::read_to_string(out_dir.join("amr_heatmap.csv")).unwrap();
        assert_eq!(sidecar.lines().next().unwrap(), "sample_id,blaZ,mecA");
    }

    #[test]
    fn optional_columns_are_optional() {
        let temp = tempfile::tempdir().unwrap();
        let results = write_results(temp.path(), "results.csv", "sample_id,notes\nS1,fine\n");
        let out_dir = temp.path().join("plots");

        let outcome = visualize(&results, &out_dir).unwrap();
        assert!(outcome.images.is_empty());
    }

    #[test]
    fn missing_sample_key_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let results = write_results(temp.path(), "results.csv", "name,genes\nS1,mecA\n");

        let err = visualize(&results, &temp.path().join("plots")).unwrap_err();
        assert_matches!(err, SheetError::MissingColumn(_));
    }

    #[test]
    fn sample_column_accepts_sample_alias() {
        let temp = tempfile::tempdir().unwrap();
        let results = write_results(
            temp.path(),
            "results.csv",
            "sample,amrfinder_genes\nS1,mecA\n",
        );
        let outcome = visualize(&results, &temp.path().join("plots")).unwrap();
        assert_eq!(outcome.images.len(), 1);
    }
}
