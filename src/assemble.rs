//! Property assembly: walks a declaration's fields, expanding structured
//! references into nested objects and mapping everything else to typed
//! leaves.

use std::path::PathBuf;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::errors::MappingError;
use crate::model::{Declaration, DeclarationSet};
use crate::resolve::Resolver;
use crate::tags;
use crate::typemap;

/// Property objects keyed by field name. Keys serialize in sorted order.
pub type PropertyMap = Map<String, Value>;

/// Build the property map for one declaration.
pub fn assemble(
    decl: &Declaration,
    set: &Rc<DeclarationSet>,
    resolver: &mut Resolver,
) -> Result<PropertyMap, MappingError> {
    let mut visiting = Vec::new();
    assemble_inner(decl, set, resolver, &mut visiting)
}

fn assemble_inner(
    decl: &Declaration,
    set: &Rc<DeclarationSet>,
    resolver: &mut Resolver,
    visiting: &mut Vec<(PathBuf, String)>,
) -> Result<PropertyMap, MappingError> {
    let identity = (set.origin.clone(), decl.name.clone());
    if visiting.contains(&identity) {
        return Err(MappingError::CyclicType {
            name: decl.name.clone(),
        });
    }
    visiting.push(identity);

    let mut properties = PropertyMap::new();

    for field in &decl.fields {
        let field_tags = tags::interpret(field)?;
        if field_tags.skip {
            continue;
        }

        let external = field_tags.external_name.or_else(|| field.name.clone());
        let resolved = resolver.resolve(&field.ty, set)?;

        match (resolved, external) {
            // Named structured field: nested object under its own key.
            (Some((inner, inner_set)), Some(name)) => {
                let nested = assemble_inner(&inner, &inner_set, resolver, visiting)?;
                properties.insert(
                    name,
                    Value::Object(Map::from_iter([(
                        "properties".to_string(),
                        Value::Object(nested),
                    )])),
                );
            }
            // Flattened embedding: members merge into the parent, later
            // fields overwriting earlier same-named ones.
            (Some((inner, inner_set)), None) => {
                let nested = assemble_inner(&inner, &inner_set, resolver, visiting)?;
                properties.extend(nested);
            }
            // Leaf: schema type plus any attribute tag pairs.
            (None, Some(name)) => {
                let mut leaf = Map::from_iter([(
                    "type".to_string(),
                    Value::String(typemap::schema_type(&field.ty).to_string()),
                )]);
                leaf.extend(field_tags.attributes);
                properties.insert(name, Value::Object(leaf));
            }
            // Flattened non-structured field contributes nothing.
            (None, None) => {}
        }
    }

    visiting.pop();
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use crate::resolve::ImportTable;
    use serde_json::json;

    fn assemble_first(content: &str) -> Result<PropertyMap, MappingError> {
        let parsed = parse::parse_content(content, PathBuf::from("test.rs")).unwrap();
        let name = parsed
            .annotated
            .first()
            .cloned()
            .expect("fixture needs an annotated struct");
        let set = Rc::new(parsed.decls);
        let decl = set.get(&name).unwrap();
        let mut resolver = Resolver::new(ImportTable::default());
        assemble(&decl, &set, &mut resolver)
    }

    #[test]
    fn test_leaf_fields() {
        let properties = assemble_first(
            r#"
            /// elastic:mappings
            pub struct User {
                pub id: i64,
                pub name: String,
                pub score: f64,
            }
            "#,
        )
        .unwrap();

        assert_eq!(
            Value::Object(properties),
            json!({
                "id": {"type": "long"},
                "name": {"type": "text"},
                "score": {"type": "double"},
            })
        );
    }

    #[test]
    fn test_named_nested_object() {
        let properties = assemble_first(
            r#"
            /// elastic:mappings
            pub struct User {
                pub profile: Profile,
            }

            pub struct Profile {
                pub bio: String,
            }
            "#,
        )
        .unwrap();

        assert_eq!(
            Value::Object(properties),
            json!({
                "profile": {"properties": {"bio": {"type": "text"}}},
            })
        );
    }

    #[test]
    fn test_flatten_merges_with_last_write_wins() {
        let properties = assemble_first(
            r#"
            /// elastic:mappings
            pub struct User {
                pub name: String,
                #[serde(flatten)]
                pub base: Base,
            }

            pub struct Base {
                pub name: i64,
                pub created: i64,
            }
            "#,
        )
        .unwrap();

        // The embedding comes later, so its `name` wins.
        assert_eq!(
            Value::Object(properties),
            json!({
                "name": {"type": "long"},
                "created": {"type": "long"},
            })
        );
    }

    #[test]
    fn test_skip_and_rename() {
        let properties = assemble_first(
            r#"
            /// elastic:mappings
            pub struct User {
                #[json("-")]
                pub password: String,
                #[json("user_name")]
                pub name: String,
            }
            "#,
        )
        .unwrap();

        assert_eq!(
            Value::Object(properties),
            json!({
                "user_name": {"type": "text"},
            })
        );
    }

    #[test]
    fn test_attributes_extend_leaf() {
        let properties = assemble_first(
            r#"
            /// elastic:mappings
            pub struct User {
                #[es("analyzer:ik_smart,type:keyword")]
                pub name: String,
            }
            "#,
        )
        .unwrap();

        // Attribute pairs overwrite the computed type on key collision.
        assert_eq!(
            Value::Object(properties),
            json!({
                "name": {"type": "keyword", "analyzer": "ik_smart"},
            })
        );
    }

    #[test]
    fn test_array_of_local_struct_nests() {
        let properties = assemble_first(
            r#"
            /// elastic:mappings
            pub struct User {
                pub tags: Vec<Tag>,
                pub labels: Vec<String>,
            }

            pub struct Tag {
                pub label: String,
            }
            "#,
        )
        .unwrap();

        assert_eq!(
            Value::Object(properties),
            json!({
                "tags": {"properties": {"label": {"type": "text"}}},
                "labels": {"type": "array"},
            })
        );
    }

    #[test]
    fn test_self_cycle_is_fatal() {
        let err = assemble_first(
            r#"
            /// elastic:mappings
            pub struct Node {
                pub next: Node,
            }
            "#,
        )
        .unwrap_err();

        match err {
            MappingError::CyclicType { name } => assert_eq!(name, "Node"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mutual_cycle_is_fatal() {
        let err = assemble_first(
            r#"
            /// elastic:mappings
            pub struct A {
                pub b: B,
            }

            pub struct B {
                pub a: A,
            }
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, MappingError::CyclicType { .. }));
    }

    #[test]
    fn test_repeated_sibling_reference_is_not_a_cycle() {
        let properties = assemble_first(
            r#"
            /// elastic:mappings
            pub struct Pair {
                pub left: Point,
                pub right: Point,
            }

            pub struct Point {
                pub x: i64,
            }
            "#,
        )
        .unwrap();

        assert_eq!(
            Value::Object(properties),
            json!({
                "left": {"properties": {"x": {"type": "long"}}},
                "right": {"properties": {"x": {"type": "long"}}},
            })
        );
    }

    #[test]
    fn test_empty_struct_yields_empty_map() {
        let properties = assemble_first(
            r#"
            /// elastic:mappings
            pub struct Empty {}
            "#,
        )
        .unwrap();
        assert!(properties.is_empty());
    }
}
