//! Schema-shape descriptors and their OpenAPI rendering.
//!
//! A descriptor's tag never changes once built; the algebra only combines
//! descriptors of the same tag. All operations return new descriptors, the
//! same subtree may be shared by several in-progress variants.

use serde_json::{Map, Number, Value};

use crate::sets::{FieldSet, OrderedSet};

/// Descriptive metadata passed through unchanged from the input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Meta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub examples: Vec<Value>,
}

impl Meta {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.default.is_none()
            && self.examples.is_empty()
    }

    /// Fill fields missing from `self` with `other`'s.
    pub fn or(&self, other: &Meta) -> Meta {
        Meta {
            title: self.title.clone().or_else(|| other.title.clone()),
            description: self
                .description
                .clone()
                .or_else(|| other.description.clone()),
            default: self.default.clone().or_else(|| other.default.clone()),
            examples: if self.examples.is_empty() {
                other.examples.clone()
            } else {
                self.examples.clone()
            },
        }
    }

    fn write(&self, out: &mut Map<String, Value>) {
        if let Some(title) = &self.title {
            out.insert("title".to_string(), Value::String(title.clone()));
        }
        if let Some(description) = &self.description {
            out.insert("description".to_string(), Value::String(description.clone()));
        }
        if let Some(default) = &self.default {
            out.insert("default".to_string(), default.clone());
        }
        match self.examples.as_slice() {
            [] => {}
            [example] => {
                out.insert("example".to_string(), example.clone());
            }
            many => {
                out.insert("examples".to_string(), Value::Array(many.to_vec()));
            }
        }
    }
}

/// Kind of a disjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisjunctionKind {
    OneOf,
    AnyOf,
    AllOf,
}

impl DisjunctionKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            DisjunctionKind::OneOf => "oneOf",
            DisjunctionKind::AnyOf => "anyOf",
            DisjunctionKind::AllOf => "allOf",
        }
    }
}

/// Ordered property map. Equality ignores key order.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    entries: Vec<(String, Schema)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Schema> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace, keeping the original position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, schema: Schema) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = schema,
            None => self.entries.push((key, schema)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Schema> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Schema)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl PartialEq for Properties {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, schema)| other.get(key) == Some(schema))
    }
}

impl FromIterator<(String, Schema)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, Schema)>>(iter: I) -> Self {
        let mut properties = Properties::new();
        for (key, schema) in iter {
            properties.insert(key, schema);
        }
        properties
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    pub meta: Meta,
    pub properties: Properties,
    pub required: FieldSet,
    pub additional_properties: bool,
    pub nullable: bool,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|r| r == key)
    }

    pub fn require(&mut self, key: &str) {
        self.required.insert(key.to_string());
    }

    pub fn unrequire(&mut self, key: &str) {
        self.required.remove(&key.to_string());
    }

    /// Drop a property together with its required entry.
    pub fn remove_property(&mut self, key: &str) -> Option<Schema> {
        self.unrequire(key);
        self.properties.remove(key)
    }

    /// Builder-style property insertion.
    pub fn with_property(mut self, key: &str, schema: Schema, required: bool) -> Self {
        self.properties.insert(key, schema);
        if required {
            self.require(key);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringSchema {
    pub meta: Meta,
    pub enumeration: Option<OrderedSet<String>>,
    /// Values excluded by a `diff` against an unrestricted string.
    pub not_enum: OrderedSet<String>,
    pub pattern: Option<String>,
    pub format: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub nullable: bool,
}

impl StringSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enum<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            enumeration: Some(values.into_iter().map(str::to_string).collect()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberSchema {
    pub meta: Meta,
    pub enumeration: Option<OrderedSet<Number>>,
    pub not_enum: OrderedSet<Number>,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub integer: bool,
    pub format: Option<String>,
    pub nullable: bool,
}

impl NumberSchema {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BooleanSchema {
    pub meta: Meta,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub meta: Meta,
    pub items: Box<Schema>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub nullable: bool,
}

/// Named pointer into the component table, resolved lazily.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceSchema {
    pub collection: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Disjunction {
    pub meta: Meta,
    pub kind: DisjunctionKind,
    pub branches: Vec<Schema>,
}

/// Tagged schema-shape descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Object(ObjectSchema),
    String(StringSchema),
    Number(NumberSchema),
    Boolean(BooleanSchema),
    Array(ArraySchema),
    Reference(ReferenceSchema),
    Disjunction(Disjunction),
}

impl Schema {
    /// Tag name used in error messages.
    pub fn tag(&self) -> &'static str {
        match self {
            Schema::Object(_) => "object",
            Schema::String(_) => "string",
            Schema::Number(_) => "number",
            Schema::Boolean(_) => "boolean",
            Schema::Array(_) => "array",
            Schema::Reference(_) => "reference",
            Schema::Disjunction(d) => d.kind.keyword(),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Schema::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn meta(&self) -> Option<&Meta> {
        match self {
            Schema::Object(s) => Some(&s.meta),
            Schema::String(s) => Some(&s.meta),
            Schema::Number(s) => Some(&s.meta),
            Schema::Boolean(s) => Some(&s.meta),
            Schema::Array(s) => Some(&s.meta),
            Schema::Disjunction(s) => Some(&s.meta),
            Schema::Reference(_) => None,
        }
    }

    /// Render as an OpenAPI schema object.
    ///
    /// `prefix` is prepended to `<collection>/<name>` for references.
    pub fn to_value(&self, prefix: &str) -> Value {
        let mut out = Map::new();
        match self {
            Schema::Object(object) => {
                out.insert("type".to_string(), Value::String("object".to_string()));
                object.meta.write(&mut out);
                let properties: Map<String, Value> = object
                    .properties
                    .iter()
                    .map(|(key, schema)| (key.clone(), schema.to_value(prefix)))
                    .collect();
                out.insert("properties".to_string(), Value::Object(properties));
                if !object.required.is_empty() {
                    out.insert(
                        "required".to_string(),
                        Value::Array(
                            object
                                .required
                                .iter()
                                .map(|r| Value::String(r.clone()))
                                .collect(),
                        ),
                    );
                }
                if !object.additional_properties {
                    out.insert("additionalProperties".to_string(), Value::Bool(false));
                }
                write_nullable(&mut out, object.nullable);
            }
            Schema::String(string) => {
                out.insert("type".to_string(), Value::String("string".to_string()));
                string.meta.write(&mut out);
                if let Some(values) = &string.enumeration {
                    out.insert("enum".to_string(), strings(values));
                }
                if !string.not_enum.is_empty() {
                    out.insert("not".to_string(), not_enum(strings(&string.not_enum)));
                }
                if let Some(pattern) = &string.pattern {
                    out.insert("pattern".to_string(), Value::String(pattern.clone()));
                }
                if let Some(format) = &string.format {
                    out.insert("format".to_string(), Value::String(format.clone()));
                }
                if let Some(min) = string.min_length {
                    out.insert("minLength".to_string(), Value::from(min));
                }
                if let Some(max) = string.max_length {
                    out.insert("maxLength".to_string(), Value::from(max));
                }
                write_nullable(&mut out, string.nullable);
            }
            Schema::Number(number) => {
                let type_name = if number.integer { "integer" } else { "number" };
                out.insert("type".to_string(), Value::String(type_name.to_string()));
                number.meta.write(&mut out);
                if let Some(values) = &number.enumeration {
                    out.insert("enum".to_string(), numbers(values));
                }
                if !number.not_enum.is_empty() {
                    out.insert("not".to_string(), not_enum(numbers(&number.not_enum)));
                }
                if let Some(min) = &number.minimum {
                    out.insert("minimum".to_string(), Value::Number(min.clone()));
                }
                if let Some(max) = &number.maximum {
                    out.insert("maximum".to_string(), Value::Number(max.clone()));
                }
                if let Some(format) = &number.format {
                    out.insert("format".to_string(), Value::String(format.clone()));
                }
                write_nullable(&mut out, number.nullable);
            }
            Schema::Boolean(boolean) => {
                out.insert("type".to_string(), Value::String("boolean".to_string()));
                boolean.meta.write(&mut out);
                write_nullable(&mut out, boolean.nullable);
            }
            Schema::Array(array) => {
                out.insert("type".to_string(), Value::String("array".to_string()));
                array.meta.write(&mut out);
                out.insert("items".to_string(), array.items.to_value(prefix));
                if let Some(min) = array.min_items {
                    out.insert("minItems".to_string(), Value::from(min));
                }
                if let Some(max) = array.max_items {
                    out.insert("maxItems".to_string(), Value::from(max));
                }
                write_nullable(&mut out, array.nullable);
            }
            Schema::Reference(reference) => {
                out.insert(
                    "$ref".to_string(),
                    Value::String(format!(
                        "{}{}/{}",
                        prefix, reference.collection, reference.name
                    )),
                );
            }
            Schema::Disjunction(disjunction) => {
                disjunction.meta.write(&mut out);
                out.insert(
                    disjunction.kind.keyword().to_string(),
                    Value::Array(
                        disjunction
                            .branches
                            .iter()
                            .map(|branch| branch.to_value(prefix))
                            .collect(),
                    ),
                );
            }
        }
        Value::Object(out)
    }
}

fn write_nullable(out: &mut Map<String, Value>, nullable: bool) {
    if nullable {
        out.insert("nullable".to_string(), Value::Bool(true));
    }
}

fn strings(values: &OrderedSet<String>) -> Value {
    Value::Array(values.iter().map(|v| Value::String(v.clone())).collect())
}

fn numbers(values: &OrderedSet<Number>) -> Value {
    Value::Array(values.iter().map(|v| Value::Number(v.clone())).collect())
}

fn not_enum(values: Value) -> Value {
    let mut not = Map::new();
    not.insert("enum".to_string(), values);
    Value::Object(not)
}
