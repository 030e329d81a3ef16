//! esmapgen core library.
//!
//! Generates Elasticsearch index-mapping JSON documents from annotated Rust
//! struct declarations: `/// elastic:mappings` elects a struct, `#[json]`
//! controls field naming, `#[es]` adds mapping attributes, and
//! `#[serde(flatten)]` merges an embedded struct's fields into its parent.

pub mod assemble;
pub mod emit;
pub mod errors;
pub mod generator;
pub mod model;
pub mod parse;
pub mod resolve;
pub mod tags;
pub mod typemap;

pub use assemble::{assemble, PropertyMap};
pub use errors::MappingError;
pub use generator::{GeneratedMapping, Generator, DEFAULT_SUFFIX};
pub use model::{Declaration, DeclarationSet, Field, TypeRef};
