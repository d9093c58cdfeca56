mod schemas;

pub use schemas::{iris_row_schema, iris_schema};
