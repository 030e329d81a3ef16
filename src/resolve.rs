//! Import resolution: maps package aliases to directories on disk and loads
//! the declarations found there.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use walkdir::WalkDir;

use crate::errors::MappingError;
use crate::model::{DeclarationSet, TypeRef};
use crate::parse::{self, RawImport};

/// Alias to directory table for one source file.
///
/// Built once per file. Imports whose path does not name a directory near
/// the source file are discarded; fields typed through them later degrade to
/// leaves instead of failing.
#[derive(Debug, Default)]
pub struct ImportTable {
    entries: HashMap<String, PathBuf>,
}

impl ImportTable {
    pub fn build(raw: &[RawImport], source_path: &Path) -> Self {
        let mut entries = HashMap::new();
        let start = source_path.parent().unwrap_or_else(|| Path::new("."));

        for import in raw {
            let relative: PathBuf = import.segments.iter().collect();
            let mut resolved = None;
            for base in start.ancestors() {
                let candidate = base.join(&relative);
                if candidate.is_dir() {
                    resolved = Some(candidate);
                    break;
                }
            }

            match resolved {
                Some(dir) => {
                    entries.insert(import.alias.clone(), dir);
                }
                None => {
                    log::debug!(
                        "import `{}` does not resolve to a directory near {}",
                        import.alias,
                        source_path.display()
                    );
                }
            }
        }

        Self { entries }
    }

    pub fn lookup(&self, alias: &str) -> Option<&Path> {
        self.entries.get(alias).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves type references to declarations, loading imported package
/// directories on demand.
pub struct Resolver {
    imports: ImportTable,
    dir_cache: HashMap<PathBuf, Rc<DeclarationSet>>,
}

impl Resolver {
    pub fn new(imports: ImportTable) -> Self {
        Self {
            imports,
            dir_cache: HashMap::new(),
        }
    }

    /// Find the declaration a type reference points at, along with the set
    /// it lives in. `Ok(None)` means the type is not structured here and the
    /// caller should emit a leaf.
    pub fn resolve(
        &mut self,
        ty: &TypeRef,
        current: &Rc<DeclarationSet>,
    ) -> Result<Option<(Rc<crate::model::Declaration>, Rc<DeclarationSet>)>, MappingError> {
        match ty {
            TypeRef::Named(name) => Ok(current.get(name).map(|decl| (decl, current.clone()))),
            TypeRef::Qualified { alias, name } => {
                let dir = match self.imports.lookup(alias) {
                    Some(dir) => dir.to_path_buf(),
                    None => return Ok(None),
                };
                let set = self.parse_directory(&dir)?;
                Ok(set.get(name).map(|decl| (decl, set)))
            }
            TypeRef::Array(elem) => self.resolve(elem, current),
        }
    }

    /// Parse every source file directly inside a package directory, merging
    /// the declarations into one cached set.
    fn parse_directory(&mut self, dir: &Path) -> Result<Rc<DeclarationSet>, MappingError> {
        if let Some(cached) = self.dir_cache.get(dir) {
            return Ok(cached.clone());
        }

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().map(|ext| ext == "rs").unwrap_or(false))
            .collect();
        files.sort();

        let mut merged = DeclarationSet::new(dir.to_path_buf());
        for file in &files {
            let parsed = parse::parse_source(file)?;
            merged.extend(parsed.decls);
        }

        log::debug!(
            "loaded {} declaration(s) from {}",
            merged.len(),
            dir.display()
        );

        let set = Rc::new(merged);
        self.dir_cache.insert(dir.to_path_buf(), set.clone());
        Ok(set)
    }
}
