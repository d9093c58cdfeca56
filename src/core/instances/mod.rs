mod dense_instance;

pub use dense_instance::{DenseInstance, MISSING_VALUE};
