//! Conversion entry points.
//!
//! Leaf descriptions map directly onto descriptors; object descriptions are
//! handed to the alternative generator. Every recursive call receives the
//! same read-only [`ConvertContext`].

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::alternatives::{generate, Condition, ConditionTest, Outcome};
use crate::components::Components;
use crate::description::{Description, Kind, Test, When};
use crate::error::ConvertError;
use crate::reference::Reference;
use crate::schema::{
    ArraySchema, BooleanSchema, Disjunction, NumberSchema, ReferenceSchema, Schema, StringSchema,
};
use crate::types::{ConvertOptions, Presence};

/// Read-only state shared by a whole conversion.
#[derive(Debug, Clone, Copy)]
pub struct ConvertContext<'a> {
    pub options: &'a ConvertOptions,
    pub components: &'a Components,
}

impl<'a> ConvertContext<'a> {
    pub fn new(options: &'a ConvertOptions, components: &'a Components) -> Self {
        Self {
            options,
            components,
        }
    }
}

/// A converted object field.
#[derive(Debug)]
pub(crate) struct Converted {
    /// `None` when no value satisfies the field.
    pub schema: Option<Schema>,
    pub presence: Presence,
    /// Rules still to be resolved by an enclosing object.
    pub conditions: Vec<Condition>,
}

/// Convert one description into a descriptor.
///
/// The description is treated as a document root: rules addressing scopes
/// beyond the outermost object are resolved there.
///
/// # Errors
///
/// Any [`ConvertError`]; no partial result is returned.
pub fn convert(description: &Value, ctx: &ConvertContext<'_>) -> Result<Schema, ConvertError> {
    let node = Description::parse(description, ctx.options, "")?;
    convert_shape(&node, ctx, "")?
        .ok_or_else(|| ConvertError::invalid("", "description admits no value"))
}

/// Convert named component descriptions and register them in order.
///
/// `definitions` maps collection names to `{ name: description }` maps.
/// Each component is registered before the next one is converted, so later
/// components may link to earlier ones.
pub fn convert_components(
    definitions: &Value,
    options: &ConvertOptions,
    components: &mut Components,
) -> Result<(), ConvertError> {
    let collections = definitions
        .as_object()
        .ok_or_else(|| ConvertError::invalid("/components", "expected object"))?;
    for (collection, entries) in collections {
        let entries = entries.as_object().ok_or_else(|| {
            ConvertError::invalid(&format!("/components/{}", collection), "expected object")
        })?;
        for (name, description) in entries {
            let path = format!("/components/{}/{}", collection, name);
            let node = Description::parse(description, options, &path)?;
            let schema = {
                let ctx = ConvertContext::new(options, components);
                convert_shape(&node, &ctx, &path)?
                    .ok_or_else(|| ConvertError::invalid(&path, "description admits no value"))?
            };
            debug!(collection = %collection, name = %name, "registered component");
            components.register(collection, name, schema);
        }
    }
    Ok(())
}

/// A converted document: its components and its root descriptor.
#[derive(Debug)]
pub struct Document {
    pub components: Components,
    pub schema: Schema,
    /// Input had no `schema` wrapper; emitted as the bare descriptor.
    bare: bool,
}

impl Document {
    /// Convert `{ "components": {..}, "schema": <description> }` or a bare
    /// description.
    pub fn convert(document: &Value, options: &ConvertOptions) -> Result<Self, ConvertError> {
        let mut components = Components::new();
        let Some(schema) = document.get("schema") else {
            let ctx = ConvertContext::new(options, &components);
            let schema = convert(document, &ctx)?;
            info!(root = schema.tag(), "converted description");
            return Ok(Self {
                components,
                schema,
                bare: true,
            });
        };

        if let Some(definitions) = document.get("components") {
            convert_components(definitions, options, &mut components)?;
        }
        let node = Description::parse(schema, options, "/schema")?;
        let ctx = ConvertContext::new(options, &components);
        let schema = convert_shape(&node, &ctx, "/schema")?
            .ok_or_else(|| ConvertError::invalid("/schema", "description admits no value"))?;
        info!(
            root = schema.tag(),
            components = components.len(),
            "converted document"
        );
        Ok(Self {
            components,
            schema,
            bare: false,
        })
    }

    /// Emit the document in the layout of its input.
    pub fn to_value(&self, prefix: &str) -> Value {
        if self.bare {
            return self.schema.to_value(prefix);
        }
        let mut out = Map::new();
        if !self.components.is_empty() {
            out.insert("components".to_string(), self.components.to_value(prefix));
        }
        out.insert("schema".to_string(), self.schema.to_value(prefix));
        Value::Object(out)
    }
}

/// Convert a whole document to JSON.
///
/// Accepts `{ "components": {..}, "schema": <description> }` or a bare
/// description. The output mirrors the input layout.
pub fn convert_document(document: &Value, options: &ConvertOptions) -> Result<Value, ConvertError> {
    Ok(Document::convert(document, options)?.to_value(&options.component_prefix))
}

/// Convert an object field, returning its rules for the enclosing object.
pub(crate) fn convert_field(
    node: &Description,
    ctx: &ConvertContext<'_>,
    path: &str,
) -> Result<Converted, ConvertError> {
    let (schema, mut conditions) = convert_kind(node, ctx, path, false)?;
    for when in &node.whens {
        conditions.push(condition(when, ctx)?);
    }
    Ok(Converted {
        schema,
        presence: node.presence.unwrap_or_default(),
        conditions,
    })
}

/// Convert a description standing on its own: a document root, an array
/// item, an alternatives branch, or a rule shape.
fn convert_shape(
    node: &Description,
    ctx: &ConvertContext<'_>,
    path: &str,
) -> Result<Option<Schema>, ConvertError> {
    if let Some(when) = node.whens.first() {
        return Err(ConvertError::missing(&when.path, when.raw.clone()));
    }
    let (schema, _) = convert_kind(node, ctx, path, true)?;
    Ok(schema)
}

fn convert_kind(
    node: &Description,
    ctx: &ConvertContext<'_>,
    path: &str,
    root: bool,
) -> Result<(Option<Schema>, Vec<Condition>), ConvertError> {
    let schema = match &node.kind {
        Kind::Object { .. } => {
            let generated = generate(node, ctx, path, root)?;
            return Ok((generated.schema, generated.propagated));
        }
        Kind::Any => {
            return Err(ConvertError::UnknownSchemaKind {
                path: path.to_string(),
                kind: "any".to_string(),
            })
        }
        Kind::String {
            enumeration,
            pattern,
            format,
            min_length,
            max_length,
        } => Schema::String(StringSchema {
            meta: node.meta.clone(),
            enumeration: enumeration.as_ref().map(|values| values.iter().cloned().collect()),
            pattern: pattern.clone(),
            format: format.clone(),
            min_length: *min_length,
            max_length: *max_length,
            nullable: node.nullable,
            ..StringSchema::new()
        }),
        Kind::Number {
            enumeration,
            minimum,
            maximum,
            integer,
            format,
        } => Schema::Number(NumberSchema {
            meta: node.meta.clone(),
            enumeration: enumeration.as_ref().map(|values| values.iter().cloned().collect()),
            minimum: minimum.clone(),
            maximum: maximum.clone(),
            integer: *integer,
            format: format.clone(),
            nullable: node.nullable,
            ..NumberSchema::new()
        }),
        Kind::Boolean => Schema::Boolean(BooleanSchema {
            meta: node.meta.clone(),
            nullable: node.nullable,
        }),
        Kind::Array {
            items,
            min_items,
            max_items,
        } => {
            let items_path = format!("{}/items", path);
            let items = convert_shape(items, ctx, &items_path)?
                .ok_or_else(|| ConvertError::invalid(&items_path, "items admit no value"))?;
            Schema::Array(ArraySchema {
                meta: node.meta.clone(),
                items: Box::new(items),
                min_items: *min_items,
                max_items: *max_items,
                nullable: node.nullable,
            })
        }
        Kind::Alternatives { kind, options } => {
            let mut branches = Vec::with_capacity(options.len());
            for (i, option) in options.iter().enumerate() {
                if let Some(branch) = convert_shape(option, ctx, &format!("{}/try/{}", path, i))? {
                    branches.push(branch);
                }
            }
            if branches.is_empty() {
                return Ok((None, Vec::new()));
            }
            Schema::Disjunction(Disjunction {
                meta: node.meta.clone(),
                kind: *kind,
                branches,
            })
        }
        Kind::Link { collection, name } => {
            if ctx.components.get(collection, name).is_none() {
                return Err(ConvertError::missing(path, format!("{}/{}", collection, name)));
            }
            Schema::Reference(ReferenceSchema {
                collection: collection.clone(),
                name: name.clone(),
            })
        }
    };
    Ok((Some(schema), Vec::new()))
}

/// Convert a rule attached to a field. The field path is filled in by the
/// enclosing object.
fn condition(when: &When, ctx: &ConvertContext<'_>) -> Result<Condition, ConvertError> {
    let Reference::Field { up, path } = &when.reference else {
        return Err(ConvertError::invalid(&when.path, "conditions must reference fields"));
    };

    let test = match &when.test {
        Test::Exists => ConditionTest::Exists,
        Test::Shape(shape) => match convert_outcome(shape, ctx, &format!("{}/is", when.path))?.schema {
            Some(schema) => ConditionTest::Shape(schema),
            None => ConditionTest::Exists,
        },
    };
    let then = when
        .then
        .as_deref()
        .map(|then| convert_outcome(then, ctx, &format!("{}/then", when.path)))
        .transpose()?;
    let otherwise = when
        .otherwise
        .as_deref()
        .map(|otherwise| convert_outcome(otherwise, ctx, &format!("{}/otherwise", when.path)))
        .transpose()?;

    Ok(Condition {
        field: Vec::new(),
        up: *up,
        reference: path.clone(),
        raw: when.raw.clone(),
        test,
        then,
        otherwise,
        origin: when.path.clone(),
    })
}

/// Convert a rule branch. `any` carries presence only.
fn convert_outcome(
    node: &Description,
    ctx: &ConvertContext<'_>,
    path: &str,
) -> Result<Outcome, ConvertError> {
    let schema = match node.kind {
        Kind::Any => None,
        _ => Some(
            convert_shape(node, ctx, path)?
                .ok_or_else(|| ConvertError::invalid(path, "branch admits no value"))?,
        ),
    };
    Ok(Outcome {
        schema,
        presence: node.presence,
    })
}

/// Number of top-level variants in a converted descriptor.
pub fn variant_count(schema: &Schema) -> usize {
    match schema {
        Schema::Disjunction(disjunction) => disjunction.branches.len(),
        _ => 1,
    }
}
