//! Fixed table from declared type names to index schema type tokens.

use crate::model::TypeRef;

/// Token emitted for type names outside the table.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Schema type for a reference the resolver could not expand.
pub fn schema_type(ty: &TypeRef) -> &'static str {
    match ty {
        TypeRef::Array(_) => "array",
        _ => primitive_type(ty.leaf_name().unwrap_or_default()),
    }
}

fn primitive_type(name: &str) -> &'static str {
    match name {
        "i64" | "u64" => "long",
        "i16" | "i32" | "u16" | "u32" => "integer",
        "i8" | "u8" => "byte",
        "f32" => "float",
        "f64" => "double",
        "DateTime" => "date",
        "String" | "str" => "text",
        _ => UNKNOWN_TYPE,
    }
}
