mod stream;

pub use stream::{RowSink, RowStream};
