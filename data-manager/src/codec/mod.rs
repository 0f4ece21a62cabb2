//! Source-text codec: category data values to and from TypeScript modules
//!
//! A data file is a type import followed by one typed `export const`
//! holding a literal. [`decode`] reads that literal with a restricted
//! parser; [`encode`] renders a value back in the same grammar.

mod parser;
mod writer;

use serde_json::Value;

use crate::category::{Category, TYPES_IMPORT_PATH};
use crate::error::DataError;

/// Extract the value assigned to `export_name` from a data module
pub fn decode(text: &str, export_name: &str) -> Result<Value, DataError> {
    parser::parse_export(text, export_name)
}

/// Render `value` as a data module exporting `export_name`
pub fn encode(
    value: &Value,
    export_name: &str,
    declared_type: &str,
    import_path: &str,
    imported_type: &str,
) -> String {
    writer::write_module(value, export_name, declared_type, import_path, imported_type)
}

pub fn decode_category(text: &str, category: Category) -> Result<Value, DataError> {
    decode(text, category.export_name())
}

pub fn encode_category(value: &Value, category: Category) -> String {
    encode(
        value,
        category.export_name(),
        &category.declared_type(),
        TYPES_IMPORT_PATH,
        category.imported_type(),
    )
}
