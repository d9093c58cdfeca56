use crate::core::row_schema::{RowSchema, RowValue};
use crate::streams::{RowSink, RowStream};
use std::io::Error;

/// In-memory row stream over a fixed set of rows.
pub struct VecRowStream {
    schema: RowSchema,
    rows: Vec<Vec<RowValue>>,
    idx: usize,
}

impl VecRowStream {
    pub fn new(schema: RowSchema, rows: Vec<Vec<RowValue>>) -> VecRowStream {
        VecRowStream {
            schema,
            rows,
            idx: 0,
        }
    }
}

impl RowStream for VecRowStream {
    fn schema(&self) -> &RowSchema {
        &self.schema
    }

    fn has_more_rows(&self) -> bool {
        self.idx < self.rows.len()
    }

    fn next_row(&mut self) -> Option<Vec<RowValue>> {
        if !self.has_more_rows() {
            return None;
        }
        let row = self.rows[self.idx].clone();
        self.idx += 1;
        Some(row)
    }
}

/// Sink that collects every emitted row.
#[derive(Default)]
pub struct VecRowSink {
    rows: Vec<Vec<RowValue>>,
}

impl VecRowSink {
    pub fn new() -> VecRowSink {
        VecRowSink::default()
    }

    pub fn rows(&self) -> &[Vec<RowValue>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<RowValue>> {
        self.rows
    }
}

impl RowSink for VecRowSink {
    fn emit(&mut self, row: Vec<RowValue>) -> Result<(), Error> {
        self.rows.push(row);
        Ok(())
    }
}
