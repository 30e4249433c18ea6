//! Ingestion of JSON description trees.
//!
//! A description node is a JSON object with a `type` tag. This module turns
//! it into a typed [`Description`], resolving alias tags and normalizing
//! wrapped kinds (`binary`, `date`) so later stages only see concrete tags.

use serde_json::{Map, Number, Value};

use crate::components::split_component_name;
use crate::error::ConvertError;
use crate::exclusion::Exclusion;
use crate::reference::Reference;
use crate::schema::{DisjunctionKind, Meta};
use crate::types::{json_type_name, ConvertOptions, ExclusionMode, Presence, BUILTIN_KINDS};

/// A typed description node.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub kind: Kind,
    /// Explicit presence flag; `None` when the node does not set one.
    pub presence: Option<Presence>,
    pub nullable: bool,
    pub meta: Meta,
    pub whens: Vec<When>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    /// No shape. Only valid as a `then`/`otherwise` presence modifier.
    Any,
    String {
        enumeration: Option<Vec<String>>,
        pattern: Option<String>,
        format: Option<String>,
        min_length: Option<u64>,
        max_length: Option<u64>,
    },
    Number {
        enumeration: Option<Vec<Number>>,
        minimum: Option<Number>,
        maximum: Option<Number>,
        integer: bool,
        format: Option<String>,
    },
    Boolean,
    Array {
        items: Box<Description>,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },
    Object {
        keys: Vec<(String, Description)>,
        unknown: Option<bool>,
        dependencies: Vec<Exclusion>,
    },
    Alternatives {
        kind: DisjunctionKind,
        options: Vec<Description>,
    },
    Link {
        collection: String,
        name: String,
    },
}

/// What a conditional rule tests on its referenced field.
#[derive(Debug, Clone, PartialEq)]
pub enum Test {
    /// The referenced field is present.
    Exists,
    /// The referenced field matches a shape.
    Shape(Box<Description>),
}

/// A conditional rule attached to a field.
#[derive(Debug, Clone, PartialEq)]
pub struct When {
    /// Reference as written, for messages.
    pub raw: String,
    pub reference: Reference,
    pub test: Test,
    pub then: Option<Box<Description>>,
    pub otherwise: Option<Box<Description>>,
    /// Location of the rule in the input document.
    pub path: String,
}

impl Description {
    /// Parse a description node.
    ///
    /// `path` is the JSON-pointer location of `value`, used in errors.
    pub fn parse(value: &Value, options: &ConvertOptions, path: &str) -> Result<Self, ConvertError> {
        let node = value.as_object().ok_or_else(|| {
            ConvertError::invalid(path, format!("expected object, got {}", json_type_name(value)))
        })?;

        let tag = match node.get("type") {
            Some(Value::String(tag)) => tag.as_str(),
            Some(other) => {
                return Err(ConvertError::invalid(
                    path,
                    format!("\"type\" must be a string, got {}", json_type_name(other)),
                ))
            }
            None => return Err(ConvertError::invalid(path, "missing \"type\"")),
        };
        let tag = resolve_kind(tag, options, path)?;

        let presence = match get_str(node, "presence", path)? {
            Some(raw) => Some(Presence::parse(raw).ok_or_else(|| {
                ConvertError::invalid(&format!("{}/presence", path), format!("unknown presence \"{}\"", raw))
            })?),
            None => None,
        };

        let kind = parse_kind(tag, node, options, path)?;
        let whens = match node.get("whens") {
            Some(Value::Array(rules)) => rules
                .iter()
                .enumerate()
                .map(|(i, rule)| parse_when(rule, options, &format!("{}/whens/{}", path, i)))
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(ConvertError::invalid(
                    &format!("{}/whens", path),
                    format!("expected array, got {}", json_type_name(other)),
                ))
            }
            None => Vec::new(),
        };

        Ok(Self {
            kind,
            presence,
            nullable: get_bool(node, "nullable", path)?.unwrap_or(false),
            meta: parse_meta(node, path)?,
            whens,
        })
    }
}

/// Follow alias tags down to a built-in tag.
fn resolve_kind<'a>(
    tag: &'a str,
    options: &'a ConvertOptions,
    path: &str,
) -> Result<&'a str, ConvertError> {
    let mut current = tag;
    let mut seen: Vec<&str> = Vec::new();
    loop {
        if BUILTIN_KINDS.contains(&current) {
            return Ok(current);
        }
        if seen.contains(&current) {
            return Err(ConvertError::UnknownSchemaKind {
                path: path.to_string(),
                kind: tag.to_string(),
            });
        }
        seen.push(current);
        current = options
            .aliases
            .get(current)
            .map(String::as_str)
            .ok_or_else(|| ConvertError::UnknownSchemaKind {
                path: path.to_string(),
                kind: tag.to_string(),
            })?;
    }
}

fn parse_kind(
    tag: &str,
    node: &Map<String, Value>,
    options: &ConvertOptions,
    path: &str,
) -> Result<Kind, ConvertError> {
    let kind = match tag {
        "any" => Kind::Any,
        "string" => Kind::String {
            enumeration: get_string_list(node, "allow", path)?,
            pattern: get_str(node, "pattern", path)?.map(str::to_string),
            format: get_str(node, "format", path)?.map(str::to_string),
            min_length: get_u64(node, "min", path)?,
            max_length: get_u64(node, "max", path)?,
        },
        "binary" => Kind::String {
            enumeration: None,
            pattern: None,
            format: Some("binary".to_string()),
            min_length: get_u64(node, "min", path)?,
            max_length: get_u64(node, "max", path)?,
        },
        "date" => Kind::String {
            enumeration: None,
            pattern: None,
            format: Some("date-time".to_string()),
            min_length: None,
            max_length: None,
        },
        "number" => Kind::Number {
            enumeration: get_number_list(node, "allow", path)?,
            minimum: get_number(node, "min", path)?,
            maximum: get_number(node, "max", path)?,
            integer: get_bool(node, "integer", path)?.unwrap_or(false),
            format: get_str(node, "format", path)?.map(str::to_string),
        },
        "boolean" => Kind::Boolean,
        "array" => {
            let items_path = format!("{}/items", path);
            let items = node
                .get("items")
                .ok_or_else(|| ConvertError::invalid(path, "array needs \"items\""))?;
            Kind::Array {
                items: Box::new(Description::parse(items, options, &items_path)?),
                min_items: get_u64(node, "min", path)?,
                max_items: get_u64(node, "max", path)?,
            }
        }
        "object" => {
            let keys = match node.get("keys") {
                Some(Value::Object(keys)) => keys
                    .iter()
                    .map(|(key, child)| {
                        let child_path = format!("{}/keys/{}", path, key);
                        Ok((key.clone(), Description::parse(child, options, &child_path)?))
                    })
                    .collect::<Result<Vec<_>, ConvertError>>()?,
                Some(other) => {
                    return Err(ConvertError::invalid(
                        &format!("{}/keys", path),
                        format!("expected object, got {}", json_type_name(other)),
                    ))
                }
                None => Vec::new(),
            };
            let dependencies = parse_dependencies(node, &keys, path)?;
            Kind::Object {
                keys,
                unknown: get_bool(node, "unknown", path)?,
                dependencies,
            }
        }
        "alternatives" => {
            let kind = match get_str(node, "match", path)? {
                None | Some("one") => DisjunctionKind::OneOf,
                Some("any") => DisjunctionKind::AnyOf,
                Some("all") => DisjunctionKind::AllOf,
                Some(other) => {
                    return Err(ConvertError::invalid(
                        &format!("{}/match", path),
                        format!("unknown match mode \"{}\"", other),
                    ))
                }
            };
            let branches = match node.get("try") {
                Some(Value::Array(items)) if !items.is_empty() => items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| Description::parse(item, options, &format!("{}/try/{}", path, i)))
                    .collect::<Result<Vec<_>, _>>()?,
                _ => {
                    return Err(ConvertError::invalid(
                        path,
                        "alternatives need a non-empty \"try\" array",
                    ))
                }
            };
            Kind::Alternatives {
                kind,
                options: branches,
            }
        }
        "link" => {
            let target = get_str(node, "ref", path)?
                .ok_or_else(|| ConvertError::invalid(path, "link needs \"ref\""))?;
            let (collection, name) = split_component_name(target);
            Kind::Link {
                collection: collection.to_string(),
                name: name.to_string(),
            }
        }
        other => {
            return Err(ConvertError::UnknownSchemaKind {
                path: path.to_string(),
                kind: other.to_string(),
            })
        }
    };
    Ok(kind)
}

fn parse_when(value: &Value, options: &ConvertOptions, path: &str) -> Result<When, ConvertError> {
    let node = value.as_object().ok_or_else(|| {
        ConvertError::invalid(path, format!("expected object, got {}", json_type_name(value)))
    })?;

    let raw = get_str(node, "ref", path)?
        .ok_or_else(|| ConvertError::invalid(path, "rule needs \"ref\""))?;
    let reference = match Reference::parse(raw, options.separator) {
        Some(reference @ Reference::Field { .. }) => reference,
        Some(Reference::Component { .. }) => {
            return Err(ConvertError::invalid(
                &format!("{}/ref", path),
                "conditions must reference fields, not components",
            ))
        }
        None => {
            return Err(ConvertError::invalid(
                &format!("{}/ref", path),
                format!("malformed reference \"{}\"", raw),
            ))
        }
    };

    let branch = |key: &str| -> Result<Option<Box<Description>>, ConvertError> {
        node.get(key)
            .map(|v| Description::parse(v, options, &format!("{}/{}", path, key)).map(Box::new))
            .transpose()
    };
    let mut then = branch("then")?;
    let mut otherwise = branch("otherwise")?;

    let test = match node.get("is") {
        None => Test::Exists,
        Some(Value::String(s)) if s == "exists" => Test::Exists,
        Some(Value::String(s)) if s == "forbidden" => {
            std::mem::swap(&mut then, &mut otherwise);
            Test::Exists
        }
        Some(shape) => Test::Shape(Box::new(Description::parse(
            shape,
            options,
            &format!("{}/is", path),
        )?)),
    };

    Ok(When {
        raw: raw.to_string(),
        reference,
        test,
        then,
        otherwise,
        path: path.to_string(),
    })
}

fn parse_dependencies(
    node: &Map<String, Value>,
    keys: &[(String, Description)],
    path: &str,
) -> Result<Vec<Exclusion>, ConvertError> {
    let Some(value) = node.get("dependencies") else {
        return Ok(Vec::new());
    };
    let deps_path = format!("{}/dependencies", path);
    let items = value.as_array().ok_or_else(|| {
        ConvertError::invalid(&deps_path, format!("expected array, got {}", json_type_name(value)))
    })?;

    let mut relations = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{}/{}", deps_path, i);
        let entry = item.as_object().ok_or_else(|| {
            ConvertError::invalid(&item_path, format!("expected object, got {}", json_type_name(item)))
        })?;
        let rel = get_str(entry, "rel", &item_path)?
            .ok_or_else(|| ConvertError::invalid(&item_path, "relation needs \"rel\""))?;
        let mode = ExclusionMode::parse(rel).ok_or_else(|| {
            ConvertError::invalid(&item_path, format!("unknown relation \"{}\"", rel))
        })?;
        let peers = get_string_list(entry, "peers", &item_path)?.unwrap_or_default();
        if peers.len() < 2 {
            return Err(ConvertError::invalid(&item_path, "relation needs at least two peers"));
        }
        if let Some((i, peer)) = peers
            .iter()
            .enumerate()
            .find(|(i, peer)| peers[..*i].contains(*peer))
        {
            return Err(ConvertError::invalid(
                &format!("{}/peers/{}", item_path, i),
                format!("peer \"{}\" is listed twice", peer),
            ));
        }
        for peer in &peers {
            if !keys.iter().any(|(key, _)| key == peer) {
                return Err(ConvertError::missing(&item_path, peer.clone()));
            }
        }
        relations.push(Exclusion { mode, peers });
    }
    Ok(relations)
}

fn parse_meta(node: &Map<String, Value>, path: &str) -> Result<Meta, ConvertError> {
    let examples = match node.get("examples") {
        Some(Value::Array(items)) => items.clone(),
        Some(other) => {
            return Err(ConvertError::invalid(
                &format!("{}/examples", path),
                format!("expected array, got {}", json_type_name(other)),
            ))
        }
        None => Vec::new(),
    };
    Ok(Meta {
        title: get_str(node, "title", path)?.map(str::to_string),
        description: get_str(node, "description", path)?.map(str::to_string),
        default: node.get("default").cloned(),
        examples,
    })
}

fn get_str<'a>(
    node: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<&'a str>, ConvertError> {
    match node.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(type_error(path, key, "string", other)),
    }
}

fn get_bool(node: &Map<String, Value>, key: &str, path: &str) -> Result<Option<bool>, ConvertError> {
    match node.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(type_error(path, key, "boolean", other)),
    }
}

fn get_u64(node: &Map<String, Value>, key: &str, path: &str) -> Result<Option<u64>, ConvertError> {
    match node.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| type_error(path, key, "non-negative integer", value)),
    }
}

fn get_number(node: &Map<String, Value>, key: &str, path: &str) -> Result<Option<Number>, ConvertError> {
    match node.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.clone())),
        Some(other) => Err(type_error(path, key, "number", other)),
    }
}

fn get_string_list(
    node: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<Vec<String>>, ConvertError> {
    let Some(value) = node.get(key) else {
        return Ok(None);
    };
    let items = value
        .as_array()
        .ok_or_else(|| type_error(path, key, "array of strings", value))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| type_error(path, key, "array of strings", item))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn get_number_list(
    node: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<Vec<Number>>, ConvertError> {
    let Some(value) = node.get(key) else {
        return Ok(None);
    };
    let items = value
        .as_array()
        .ok_or_else(|| type_error(path, key, "array of numbers", value))?;
    items
        .iter()
        .map(|item| match item {
            Value::Number(n) => Ok(n.clone()),
            other => Err(type_error(path, key, "array of numbers", other)),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn type_error(path: &str, key: &str, expected: &str, actual: &Value) -> ConvertError {
    ConvertError::invalid(
        &format!("{}/{}", path, key),
        format!("expected {}, got {}", expected, json_type_name(actual)),
    )
}
