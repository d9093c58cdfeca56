use crate::core::row_schema::{RowSchema, RowValue};
use std::io::Error;

/// Pull-based interface for the incoming row stream.
///
/// The schema must remain valid and immutable for the entire lifetime of
/// the stream; every row yielded by [`next_row`](RowStream::next_row) must
/// align with it (same number and order of fields). A changed schema is a
/// new stream.
pub trait RowStream {
    /// Returns the field structure of the incoming rows, available before
    /// the first row.
    fn schema(&self) -> &RowSchema;

    /// Indicates whether the stream *may* produce more rows.
    ///
    /// This call should be cheap and side effect free. If it returns
    /// `false`, a subsequent call to [`next_row`](RowStream::next_row) must
    /// return `None`.
    fn has_more_rows(&self) -> bool;

    /// Produces the next row, or `None` at end-of-stream.
    fn next_row(&mut self) -> Option<Vec<RowValue>>;
}

/// Push-based sink for scored output rows.
pub trait RowSink {
    /// Accepts one output row (input fields plus appended predictions).
    fn emit(&mut self, row: Vec<RowValue>) -> Result<(), Error>;
}
