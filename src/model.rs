use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

/// A field's declared type, reduced to the parts mapping generation cares
/// about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A bare local name, e.g. `User`.
    Named(String),
    /// A path through an imported package, e.g. `sub_data::Posts`.
    Qualified { alias: String, name: String },
    /// A sequence of elements, e.g. `Vec<T>` or `[T; N]`.
    Array(Box<TypeRef>),
}

impl TypeRef {
    /// The innermost type name, if the reference bottoms out in one.
    pub fn leaf_name(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            TypeRef::Qualified { name, .. } => Some(name),
            TypeRef::Array(elem) => elem.leaf_name(),
        }
    }
}

/// A single struct field together with its mapping annotations.
#[derive(Debug, Clone)]
pub struct Field {
    /// Declared field name. `None` for flattened embeddings, whose members
    /// merge into the parent.
    pub name: Option<String>,
    pub ty: TypeRef,
    /// Raw content of the naming annotation, unparsed.
    pub naming_tag: Option<String>,
    /// Raw content of the attribute annotation, unparsed.
    pub attr_tag: Option<String>,
}

/// A struct declaration with its fields in source order.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub fields: Vec<Field>,
}

/// All declarations gathered from one source file or package directory,
/// keyed by type name.
#[derive(Debug, Clone)]
pub struct DeclarationSet {
    /// File or directory the declarations came from. Used to tell apart
    /// same-named types from different packages.
    pub origin: PathBuf,
    decls: HashMap<String, Rc<Declaration>>,
}

impl DeclarationSet {
    pub fn new(origin: PathBuf) -> Self {
        Self {
            origin,
            decls: HashMap::new(),
        }
    }

    pub fn insert(&mut self, decl: Declaration) {
        self.decls.insert(decl.name.clone(), Rc::new(decl));
    }

    pub fn get(&self, name: &str) -> Option<Rc<Declaration>> {
        self.decls.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Absorb every declaration from another set. Later insertions win on
    /// name collisions.
    pub fn extend(&mut self, other: DeclarationSet) {
        self.decls.extend(other.decls);
    }
}
