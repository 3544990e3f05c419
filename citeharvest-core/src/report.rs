//! Report table and CSV serialization.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ReportError;
use crate::types::NormalizedRow;

/// Rows from every identifier in traversal order. Not deduplicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportTable {
    rows: Vec<NormalizedRow>,
}

/// What happened when the table was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { path: PathBuf, rows: usize },
    /// The table was empty; no file was created.
    SkippedEmpty,
}

impl ReportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: NormalizedRow) {
        self.rows.push(row);
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = NormalizedRow>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows contributed per identifier, in order of first appearance.
    pub fn counts_by_identifier(&self) -> Vec<(String, usize)> {
        let mut order: Vec<(String, usize)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for row in &self.rows {
            match positions.get(row.original_doi.as_str()) {
                Some(&pos) => order[pos].1 += 1,
                None => {
                    positions.insert(row.original_doi.as_str(), order.len());
                    order.push((row.original_doi.clone(), 1));
                }
            }
        }
        order
    }

    /// Serialize header plus rows as CSV into `writer`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(writer);
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Write the table to `path`. An empty table writes nothing.
    pub fn write_to_path(&self, path: &Path) -> Result<WriteOutcome, ReportError> {
        if self.is_empty() {
            return Ok(WriteOutcome::SkippedEmpty);
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ReportError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        let file = std::fs::File::create(path).map_err(|e| ReportError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.write_csv(std::io::BufWriter::new(file))?;
        info!(path = %path.display(), rows = self.len(), "Wrote citation report");
        Ok(WriteOutcome::Written {
            path: path.to_path_buf(),
            rows: self.len(),
        })
    }
}
