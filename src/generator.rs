//! Per-file orchestration: parse, resolve, assemble, and write mapping
//! documents for one source file.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;

use crate::assemble;
use crate::emit;
use crate::errors::MappingError;
use crate::parse;
use crate::resolve::{ImportTable, Resolver};

/// Output filename suffix used when none is configured.
pub const DEFAULT_SUFFIX: &str = "mappings";

/// One mapping document written for an annotated declaration.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedMapping {
    pub declaration: String,
    pub output_path: PathBuf,
}

/// Mapping generator for annotated struct declarations.
///
/// # Example
///
/// ```no_run
/// use esmapgen::Generator;
///
/// let generated = Generator::new()
///     .suffix("index")
///     .generate("src/data/users.rs".as_ref())
///     .unwrap();
/// for mapping in generated {
///     println!("{} -> {}", mapping.declaration, mapping.output_path.display());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Generator {
    suffix: String,
}

impl Generator {
    pub fn new() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }

    /// Set the output filename suffix. An empty value keeps the default.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        if !suffix.is_empty() {
            self.suffix = suffix;
        }
        self
    }

    /// Generate mapping documents for every annotated declaration in one
    /// source file. Documents land next to the source, all at the same
    /// derived path; with several annotated declarations the last one wins.
    pub fn generate(&self, source: &Path) -> Result<Vec<GeneratedMapping>, MappingError> {
        let parsed = parse::parse_source(source)?;
        log::debug!(
            "{}: {} declaration(s), {} annotated",
            source.display(),
            parsed.decls.len(),
            parsed.annotated.len()
        );

        let imports = ImportTable::build(&parsed.imports, source);
        let mut resolver = Resolver::new(imports);
        let set = Rc::new(parsed.decls);
        let out_path = emit::output_path(source, &self.suffix);

        let mut generated = Vec::new();
        for name in &parsed.annotated {
            let decl = match set.get(name) {
                Some(decl) => decl,
                None => continue,
            };
            let properties = assemble::assemble(&decl, &set, &mut resolver)?;
            let document = emit::mapping_document(properties);
            emit::write_document(&out_path, &document)?;
            generated.push(GeneratedMapping {
                declaration: name.clone(),
                output_path: out_path.clone(),
            });
        }

        Ok(generated)
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}
