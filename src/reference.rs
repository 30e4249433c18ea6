//! Reference parsing and resolution.
//!
//! A reference is either a separator-delimited field path, relative to an
//! object scope, or a registered component name prefixed with `#`.

use std::fmt;

use crate::algebra::expand;
use crate::components::{split_component_name, Components};
use crate::error::ConvertError;
use crate::schema::{ObjectSchema, Schema};

/// Parsed reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Field path. `up` counts scopes above the referring field: 0 is the
    /// field's own children, 1 its siblings, 2 its parent's siblings.
    Field { up: usize, path: Vec<String> },
    /// Registered component, optionally followed by a path inside it.
    Component {
        collection: String,
        name: String,
        path: Vec<String>,
    },
}

impl Reference {
    /// Parse a raw reference.
    ///
    /// Returns `None` for an empty path or an empty segment.
    pub fn parse(raw: &str, separator: char) -> Option<Self> {
        if let Some(rest) = raw.strip_prefix('#') {
            let mut segments = rest.split(separator);
            let (collection, name) = split_component_name(segments.next()?);
            if name.is_empty() {
                return None;
            }
            let path = segments.map(str::to_string).collect::<Vec<_>>();
            if path.iter().any(String::is_empty) {
                return None;
            }
            return Some(Reference::Component {
                collection: collection.to_string(),
                name: name.to_string(),
                path,
            });
        }

        let dots = raw.chars().take_while(|c| *c == separator).count();
        let rest = &raw[dots * separator.len_utf8()..];
        if rest.is_empty() {
            return None;
        }
        let path: Vec<String> = rest.split(separator).map(str::to_string).collect();
        if path.iter().any(String::is_empty) {
            return None;
        }
        let up = if dots == 0 { 1 } else { dots - 1 };
        Some(Reference::Field { up, path })
    }

    /// Path segments, relative to the scope the reference resolves in.
    pub fn path(&self) -> &[String] {
        match self {
            Reference::Field { path, .. } | Reference::Component { path, .. } => path,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Field { up, path } => {
                write!(f, "{}^{}", path.join("."), up)
            }
            Reference::Component {
                collection,
                name,
                path,
            } => {
                write!(f, "#{}/{}", collection, name)?;
                for segment in path {
                    write!(f, ".{}", segment)?;
                }
                Ok(())
            }
        }
    }
}

/// Resolve a reference to the descriptor it points at.
///
/// Field references walk `scope`'s properties segment by segment, descending
/// through nested objects (and component references, looked up in
/// `components`). A final reference descriptor is returned already expanded.
///
/// # Errors
///
/// `MissingReferenceTarget` when a segment or a component is absent.
pub fn resolve<'a>(
    reference: &Reference,
    scope: &'a ObjectSchema,
    components: &'a Components,
) -> Result<&'a Schema, ConvertError> {
    let missing = || ConvertError::missing("", reference.to_string());
    match reference {
        Reference::Field { path, .. } => walk(scope, path, components)?.ok_or_else(missing),
        Reference::Component {
            collection,
            name,
            path,
        } => {
            let target = components.get(collection, name).ok_or_else(missing)?;
            let target = expand(target, components)?;
            if path.is_empty() {
                return Ok(target);
            }
            match find_object(target, &path[0], components)? {
                Some(object) => walk(object, path, components)?.ok_or_else(missing),
                None => Err(missing()),
            }
        }
    }
}

/// Walk `path` through `scope`, returning `None` when a segment is absent.
pub fn walk<'a>(
    scope: &'a ObjectSchema,
    path: &[String],
    components: &'a Components,
) -> Result<Option<&'a Schema>, ConvertError> {
    let Some((head, rest)) = path.split_first() else {
        return Ok(None);
    };
    let Some(value) = scope.properties.get(head) else {
        return Ok(None);
    };
    let value = expand(value, components)?;
    let Some(next) = rest.first() else {
        return Ok(Some(value));
    };
    match find_object(value, next, components)? {
        Some(object) => walk(object, rest, components),
        None => Ok(None),
    }
}

/// The object shape inside `schema` that declares `key`.
///
/// For a disjunction, the first object branch declaring `key` is used.
fn find_object<'a>(
    schema: &'a Schema,
    key: &str,
    components: &'a Components,
) -> Result<Option<&'a ObjectSchema>, ConvertError> {
    match expand(schema, components)? {
        Schema::Object(object) => Ok(Some(object)),
        Schema::Disjunction(disjunction) => {
            for branch in &disjunction.branches {
                if let Schema::Object(object) = expand(branch, components)? {
                    if object.properties.contains_key(key) {
                        return Ok(Some(object));
                    }
                }
            }
            Ok(None)
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ReferenceSchema, StringSchema};

    fn field(up: usize, path: &[&str]) -> Reference {
        Reference::Field {
            up,
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn parse_sibling_paths() {
        assert_eq!(Reference::parse("method", '.'), Some(field(1, &["method"])));
        assert_eq!(Reference::parse("..method", '.'), Some(field(1, &["method"])));
        assert_eq!(Reference::parse("a.b", '.'), Some(field(1, &["a", "b"])));
    }

    #[test]
    fn parse_scope_climbing() {
        assert_eq!(Reference::parse(".own", '.'), Some(field(0, &["own"])));
        assert_eq!(Reference::parse("...outer", '.'), Some(field(2, &["outer"])));
        assert_eq!(Reference::parse("////outer", '/'), Some(field(3, &["outer"])));
    }

    #[test]
    fn parse_component() {
        assert_eq!(
            Reference::parse("#Address.country", '.'),
            Some(Reference::Component {
                collection: "schemas".into(),
                name: "Address".into(),
                path: vec!["country".into()],
            })
        );
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(Reference::parse("", '.'), None);
        assert_eq!(Reference::parse("..", '.'), None);
        assert_eq!(Reference::parse("a..b", '.'), None);
        assert_eq!(Reference::parse("#", '.'), None);
    }

    #[test]
    fn resolve_through_component_reference() {
        let mut components = Components::new();
        let address = ObjectSchema::new().with_property(
            "country",
            Schema::String(StringSchema::with_enum(["NL", "BE"])),
            true,
        );
        components.register("schemas", "Address", Schema::Object(address));

        let scope = ObjectSchema::new().with_property(
            "address",
            Schema::Reference(ReferenceSchema {
                collection: "schemas".into(),
                name: "Address".into(),
            }),
            false,
        );

        let target = resolve(&field(1, &["address", "country"]), &scope, &components).unwrap();
        assert_eq!(target.tag(), "string");

        let whole = resolve(&field(1, &["address"]), &scope, &components).unwrap();
        assert_eq!(whole.tag(), "object");
    }

    #[test]
    fn resolve_component_by_name() {
        let mut components = Components::new();
        components.register("schemas", "Code", Schema::String(StringSchema::new()));
        let reference = Reference::parse("#Code", '.').unwrap();
        let scope = ObjectSchema::new();
        let target = resolve(&reference, &scope, &components).unwrap();
        assert_eq!(target.tag(), "string");
    }

    #[test]
    fn resolve_missing_segment_fails() {
        let scope = ObjectSchema::new();
        let components = Components::new();
        let reference = field(1, &["nope"]);
        let result = resolve(&reference, &scope, &components);
        assert!(matches!(
            result,
            Err(ConvertError::MissingReferenceTarget { .. })
        ));
    }

    #[test]
    fn resolve_missing_component_fails() {
        let reference = Reference::parse("#Ghost", '.').unwrap();
        let scope = ObjectSchema::new();
        let components = Components::new();
        let result = resolve(&reference, &scope, &components);
        assert!(matches!(
            result,
            Err(ConvertError::MissingReferenceTarget { reference, .. }) if reference == "#schemas/Ghost"
        ));
    }
}
