//! Fixed-width results report.
//!
//! Layout: one header row with every schema column, then per instance one row
//! per repetition followed by an `AVG` row. Cells are left-justified and at
//! least [`COLUMN_WIDTH`] characters wide, with no separator between them.

use crate::aggregate::InstanceAggregate;
use crate::error::HarnessError;
use crate::parser::ResultRecord;
use crate::schema::{AVG_LABEL, COLUMN_WIDTH, IDENTIFIER_FIELD, NA, SCHEMA};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Raw rows and their average for one instance.
#[derive(Debug, Clone)]
pub struct InstanceBlock {
    pub instance: String,
    pub records: Vec<ResultRecord>,
    pub aggregate: InstanceAggregate,
}

impl InstanceBlock {
    pub fn new(instance: impl Into<String>, records: Vec<ResultRecord>) -> Self {
        let aggregate = InstanceAggregate::from_records(&records);
        Self {
            instance: instance.into(),
            records,
            aggregate,
        }
    }
}

pub struct ReportWriter<W: Write> {
    out: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.write_cells(SCHEMA.iter().copied())
    }

    pub fn write_row(&mut self, record: &ResultRecord) -> io::Result<()> {
        self.write_cells(SCHEMA.iter().map(|field| record.get(field)))
    }

    pub fn write_average(&mut self, aggregate: &InstanceAggregate) -> io::Result<()> {
        let cells: Vec<String> = SCHEMA
            .iter()
            .map(|field| {
                if *field == IDENTIFIER_FIELD {
                    AVG_LABEL.to_string()
                } else {
                    format_mean(aggregate.mean(field))
                }
            })
            .collect();
        self.write_cells(cells.iter().map(String::as_str))
    }

    pub fn write_block(&mut self, block: &InstanceBlock) -> io::Result<()> {
        for record in &block.records {
            self.write_row(record)?;
        }
        self.write_average(&block.aggregate)
    }

    /// Flushes and hands back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_cells<'a>(&mut self, cells: impl Iterator<Item = &'a str>) -> io::Result<()> {
        for cell in cells {
            write!(self.out, "{:<width$}", cell, width = COLUMN_WIDTH)?;
        }
        writeln!(self.out)
    }
}

pub fn format_mean(mean: Option<f64>) -> String {
    match mean {
        Some(v) => format!("{:.2}", v),
        None => NA.to_string(),
    }
}

/// Creates (truncating) the report file.
pub fn create_report(path: &Path) -> Result<ReportWriter<BufWriter<File>>, HarnessError> {
    let file = File::create(path).map_err(|source| HarnessError::ReportDestination {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReportWriter::new(BufWriter::new(file)))
}
