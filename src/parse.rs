//! Source scanning: turns Rust source text into declarations, imports, and
//! the list of annotated type names.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::MappingError;
use crate::model::{Declaration, DeclarationSet, Field, TypeRef};

/// Marker that elects a struct for mapping generation. Matched anywhere in
/// the doc comment text.
static MAPPINGS_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"elastic:mappings").expect("marker regex"));

/// An import recorded as written, before directory resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    /// Name the importing file refers to the package by.
    pub alias: String,
    /// Path segments relative to some ancestor of the source file.
    pub segments: Vec<String>,
}

/// Everything extracted from one source file.
#[derive(Debug)]
pub struct ParsedSource {
    pub decls: DeclarationSet,
    pub imports: Vec<RawImport>,
    /// Names of marker-annotated declarations, in source order.
    pub annotated: Vec<String>,
}

/// Read and parse a source file.
pub fn parse_source(path: &Path) -> Result<ParsedSource, MappingError> {
    let content = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_content(&content, path.to_path_buf())
}

/// Parse source text already in memory. `origin` labels the resulting
/// declaration set.
pub fn parse_content(content: &str, origin: PathBuf) -> Result<ParsedSource, MappingError> {
    let file = syn::parse_file(content).map_err(|source| MappingError::Parse {
        path: origin.clone(),
        source,
    })?;

    let mut decls = DeclarationSet::new(origin);
    let mut imports = Vec::new();
    let mut annotated = Vec::new();

    for item in &file.items {
        match item {
            syn::Item::Struct(item) => {
                let decl = parse_struct(item);
                if has_marker(&item.attrs) {
                    annotated.push(decl.name.clone());
                }
                decls.insert(decl);
            }
            syn::Item::Use(item) => {
                collect_use_tree(&item.tree, &mut Vec::new(), &mut imports);
            }
            // `mod x;` pulls in a sibling package the same way `use` does.
            syn::Item::Mod(item) if item.content.is_none() => {
                let name = item.ident.to_string();
                imports.push(RawImport {
                    alias: name.clone(),
                    segments: vec![name],
                });
            }
            _ => {}
        }
    }

    Ok(ParsedSource {
        decls,
        imports,
        annotated,
    })
}

/// True when any doc comment line carries the mappings marker.
fn has_marker(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        if !attr.path().is_ident("doc") {
            return false;
        }
        if let syn::Meta::NameValue(meta) = &attr.meta
            && let syn::Expr::Lit(expr) = &meta.value
            && let syn::Lit::Str(lit) = &expr.lit
        {
            return MAPPINGS_MARKER.is_match(&lit.value());
        }
        false
    })
}

fn parse_struct(item: &syn::ItemStruct) -> Declaration {
    let mut fields = Vec::new();

    if let syn::Fields::Named(named) = &item.fields {
        for field in &named.named {
            let name = if has_serde_flatten(&field.attrs) {
                None
            } else {
                field.ident.as_ref().map(|ident| ident.to_string())
            };

            fields.push(Field {
                name,
                ty: classify_type(&field.ty),
                naming_tag: tag_literal(&field.attrs, "json"),
                attr_tag: tag_literal(&field.attrs, "es"),
            });
        }
    }

    Declaration {
        name: item.ident.to_string(),
        fields,
    }
}

/// Detect `#[serde(flatten)]` on a field.
fn has_serde_flatten(attrs: &[syn::Attribute]) -> bool {
    let mut found = false;
    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("flatten") {
                found = true;
            } else if meta.input.peek(syn::Token![=]) {
                // Consume the value of unrelated `key = value` entries.
                let _: syn::Expr = meta.value()?.parse()?;
            }
            Ok(())
        });
    }
    found
}

/// Extract the string literal of `#[name("...")]`, if present.
fn tag_literal(attrs: &[syn::Attribute], name: &str) -> Option<String> {
    attrs
        .iter()
        .find(|attr| attr.path().is_ident(name))
        .and_then(|attr| attr.parse_args::<syn::LitStr>().ok())
        .map(|lit| lit.value())
}

/// Reduce a syntactic type to the reference shape the assembler works with.
///
/// `Vec<T>`, slices, and arrays classify as sequences of their element.
/// `Option<T>` is transparent. A multi-segment path keeps its second-to-last
/// segment as the package alias.
pub fn classify_type(ty: &syn::Type) -> TypeRef {
    match ty {
        syn::Type::Path(type_path) => classify_path(&type_path.path),
        syn::Type::Array(arr) => TypeRef::Array(Box::new(classify_type(&arr.elem))),
        syn::Type::Slice(slice) => TypeRef::Array(Box::new(classify_type(&slice.elem))),
        syn::Type::Reference(reference) => classify_type(&reference.elem),
        syn::Type::Paren(paren) => classify_type(&paren.elem),
        _ => TypeRef::Named("unknown".to_string()),
    }
}

fn classify_path(path: &syn::Path) -> TypeRef {
    let last = match path.segments.last() {
        Some(segment) => segment,
        None => return TypeRef::Named("unknown".to_string()),
    };
    let name = last.ident.to_string();

    if name == "Vec" {
        if let Some(elem) = first_type_argument(last) {
            return TypeRef::Array(Box::new(classify_type(elem)));
        }
        return TypeRef::Array(Box::new(TypeRef::Named("unknown".to_string())));
    }

    if name == "Option" {
        if let Some(elem) = first_type_argument(last) {
            return classify_type(elem);
        }
        return TypeRef::Named("unknown".to_string());
    }

    if path.segments.len() >= 2 {
        let alias = path.segments[path.segments.len() - 2].ident.to_string();
        return TypeRef::Qualified { alias, name };
    }

    TypeRef::Named(name)
}

fn first_type_argument(segment: &syn::PathSegment) -> Option<&syn::Type> {
    if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
        args.args.iter().find_map(|arg| match arg {
            syn::GenericArgument::Type(ty) => Some(ty),
            _ => None,
        })
    } else {
        None
    }
}

fn collect_use_tree(tree: &syn::UseTree, prefix: &mut Vec<String>, imports: &mut Vec<RawImport>) {
    match tree {
        syn::UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            collect_use_tree(&path.tree, prefix, imports);
            prefix.pop();
        }
        syn::UseTree::Name(name) => {
            let mut segments = prefix.clone();
            segments.push(name.ident.to_string());
            push_import(name.ident.to_string(), segments, imports);
        }
        syn::UseTree::Rename(rename) => {
            let mut segments = prefix.clone();
            segments.push(rename.ident.to_string());
            push_import(rename.rename.to_string(), segments, imports);
        }
        syn::UseTree::Group(group) => {
            for item in &group.items {
                collect_use_tree(item, prefix, imports);
            }
        }
        syn::UseTree::Glob(_) => {}
    }
}

fn push_import(alias: String, segments: Vec<String>, imports: &mut Vec<RawImport>) {
    let segments: Vec<String> = segments
        .into_iter()
        .filter(|s| s != "crate" && s != "self")
        .map(|s| if s == "super" { "..".to_string() } else { s })
        .collect();
    if segments.is_empty() {
        return;
    }
    imports.push(RawImport { alias, segments });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> ParsedSource {
        parse_content(content, PathBuf::from("test.rs")).unwrap()
    }

    fn classify(ty: &str) -> TypeRef {
        classify_type(&syn::parse_str(ty).unwrap())
    }

    #[test]
    fn test_classify_primitives_and_paths() {
        assert_eq!(classify("i64"), TypeRef::Named("i64".to_string()));
        assert_eq!(classify("String"), TypeRef::Named("String".to_string()));
        assert_eq!(
            classify("sub_data::Posts"),
            TypeRef::Qualified {
                alias: "sub_data".to_string(),
                name: "Posts".to_string(),
            }
        );
    }

    #[test]
    fn test_classify_vec_and_option() {
        assert_eq!(
            classify("Vec<String>"),
            TypeRef::Array(Box::new(TypeRef::Named("String".to_string())))
        );
        assert_eq!(classify("Option<i32>"), TypeRef::Named("i32".to_string()));
        assert_eq!(
            classify("Option<Vec<Post>>"),
            TypeRef::Array(Box::new(TypeRef::Named("Post".to_string())))
        );
    }

    #[test]
    fn test_classify_datetime_keeps_leaf() {
        let ty = classify("DateTime<Utc>");
        assert_eq!(ty.leaf_name(), Some("DateTime"));
        let ty = classify("chrono::DateTime<Utc>");
        assert_eq!(ty.leaf_name(), Some("DateTime"));
    }

    #[test]
    fn test_marker_detection() {
        let parsed = parse(
            r#"
            /// elastic:mappings
            pub struct User {
                pub name: String,
            }

            pub struct Unmarked {
                pub id: i64,
            }
            "#,
        );
        assert_eq!(parsed.annotated, vec!["User".to_string()]);
        assert_eq!(parsed.decls.len(), 2);
    }

    #[test]
    fn test_marker_matches_inside_longer_comment() {
        let parsed = parse(
            r#"
            /// Index document shape.
            ///
            /// elastic:mappings generated on deploy.
            pub struct Event {
                pub at: i64,
            }
            "#,
        );
        assert_eq!(parsed.annotated, vec!["Event".to_string()]);
    }

    #[test]
    fn test_flatten_blanks_field_name() {
        let parsed = parse(
            r#"
            pub struct User {
                #[serde(flatten)]
                pub base: Base,
                #[serde(rename = "nick", default)]
                pub name: String,
            }
            "#,
        );
        let decl = parsed.decls.get("User").unwrap();
        assert_eq!(decl.fields[0].name, None);
        assert_eq!(decl.fields[1].name, Some("name".to_string()));
    }

    #[test]
    fn test_tag_literals_extracted() {
        let parsed = parse(
            r#"
            pub struct User {
                #[json("user_name,omitempty")]
                #[es("analyzer:ik_smart")]
                pub name: String,
            }
            "#,
        );
        let decl = parsed.decls.get("User").unwrap();
        assert_eq!(
            decl.fields[0].naming_tag,
            Some("user_name,omitempty".to_string())
        );
        assert_eq!(decl.fields[0].attr_tag, Some("analyzer:ik_smart".to_string()));
    }

    #[test]
    fn test_use_and_mod_imports() {
        let parsed = parse(
            r#"
            use crate::data::sub_data;
            use super::shared as common;
            use std::collections::{HashMap, HashSet};
            mod sibling;
            "#,
        );
        assert!(parsed.imports.contains(&RawImport {
            alias: "sub_data".to_string(),
            segments: vec!["data".to_string(), "sub_data".to_string()],
        }));
        assert!(parsed.imports.contains(&RawImport {
            alias: "common".to_string(),
            segments: vec!["..".to_string(), "shared".to_string()],
        }));
        assert!(parsed.imports.contains(&RawImport {
            alias: "sibling".to_string(),
            segments: vec!["sibling".to_string()],
        }));
        assert!(parsed
            .imports
            .iter()
            .any(|i| i.alias == "HashMap" && i.segments.last().unwrap() == "HashMap"));
    }

    #[test]
    fn test_parse_error_reports_path() {
        let err = parse_content("struct {", PathBuf::from("bad.rs")).unwrap_err();
        match err {
            MappingError::Parse { path, .. } => assert_eq!(path, PathBuf::from("bad.rs")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tuple_structs_have_no_fields() {
        let parsed = parse("pub struct Pair(i64, i64);");
        let decl = parsed.decls.get("Pair").unwrap();
        assert!(decl.fields.is_empty());
    }
}
