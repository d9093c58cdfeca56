pub mod attributes;
pub mod instances;
pub mod model_schema;
pub mod row_schema;
