//! Alternative generation for conditional objects.
//!
//! An object whose fields carry conditional rules, or whose peers are bound
//! by `nand`/`xor` relations, is rewritten into a list of plain object
//! variants that together admit exactly the instances the rules admit.
//!
//! Every group of rules sharing a reference and a test is one axis with a
//! positive option (the test holds) and negative options (it does not).
//! Every maximal group of exclusive peers is one axis with an option per
//! kept peer. Variants are the cross product of all axes, minus the ones
//! that are empty or covered by an earlier variant.

use tracing::{debug, trace};

use crate::algebra::{deduplicate, diff, expand, intersect, merge, remove_subsumed, Diffed};
use crate::components::Components;
use crate::converter::{convert_field, ConvertContext};
use crate::description::{Description, Kind};
use crate::error::ConvertError;
use crate::exclusion::{resolve_exclusions, ExclusionAxis, ExclusionOption};
use crate::reference::walk;
use crate::schema::{Disjunction, DisjunctionKind, Meta, ObjectSchema, Schema};
use crate::types::Presence;

/// Effect of a rule branch on the conditioned field.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Outcome {
    /// Shape merged into the field.
    pub schema: Option<Schema>,
    pub presence: Option<Presence>,
}

/// What a rule tests on its referenced field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConditionTest {
    Exists,
    Shape(Schema),
}

/// A converted rule, positioned relative to the object it currently sits in.
#[derive(Debug, Clone)]
pub(crate) struct Condition {
    /// Path from the current object to the conditioned field.
    pub field: Vec<String>,
    /// Scopes above the current object; 1 resolves against the current object.
    pub up: usize,
    /// Referenced path inside the resolving scope.
    pub reference: Vec<String>,
    /// Reference as written.
    pub raw: String,
    pub test: ConditionTest,
    pub then: Option<Outcome>,
    pub otherwise: Option<Outcome>,
    /// Location of the rule in the input document.
    pub origin: String,
}

impl Condition {
    /// Move the condition one level out, into the object declaring `key`.
    pub(crate) fn adopt(mut self, key: &str) -> Self {
        self.field.insert(0, key.to_string());
        if self.up == 0 {
            self.up = 1;
            self.reference.insert(0, key.to_string());
        }
        self
    }
}

/// Result of generating alternatives for one object.
#[derive(Debug)]
pub(crate) struct Generated {
    /// `None` when no instance satisfies the object.
    pub schema: Option<Schema>,
    /// Conditions addressing enclosing scopes, to be resolved by the caller.
    pub propagated: Vec<Condition>,
}

/// One leaf constraint of a test: a path into the object and its shape.
///
/// A leaf holds only when the path is present.
#[derive(Debug, Clone)]
struct Leaf {
    path: Vec<String>,
    shape: Schema,
}

#[derive(Debug)]
struct Member {
    field: Vec<String>,
    then: Option<Outcome>,
    otherwise: Option<Outcome>,
}

#[derive(Debug)]
struct ConditionAxis {
    raw: String,
    reference: Vec<String>,
    test: ConditionTest,
    leaves: Vec<Leaf>,
    members: Vec<Member>,
}

#[derive(Debug)]
enum Axis {
    Condition(ConditionAxis),
    Exclusion(ExclusionAxis),
}

/// Generate the variants of an object description.
///
/// At the document root (or an array item, or an alternatives branch)
/// conditions addressing scopes beyond the object are clamped to it.
pub(crate) fn generate(
    node: &Description,
    ctx: &ConvertContext<'_>,
    path: &str,
    root: bool,
) -> Result<Generated, ConvertError> {
    let Kind::Object {
        keys,
        unknown,
        dependencies,
    } = &node.kind
    else {
        return Err(ConvertError::invalid(path, "expected an object description"));
    };

    let mut base = ObjectSchema {
        meta: node.meta.clone(),
        additional_properties: unknown.unwrap_or(ctx.options.allow_unknown),
        nullable: node.nullable,
        ..ObjectSchema::new()
    };
    // Shapes of every declared field, forbidden ones included, for reference
    // resolution and for outcomes that bring a field back.
    let mut declared = base.clone();
    let mut conditions = Vec::new();

    for (key, child) in keys {
        let converted = convert_field(child, ctx, &format!("{}/keys/{}", path, key))?;
        conditions.extend(converted.conditions.into_iter().map(|c| c.adopt(key)));
        let Some(schema) = converted.schema else {
            if converted.presence == Presence::Required {
                debug!(path, field = %key, "required field admits no value");
                return Ok(Generated {
                    schema: None,
                    propagated: Vec::new(),
                });
            }
            continue;
        };
        declared.properties.insert(key.clone(), schema.clone());
        match converted.presence {
            Presence::Forbidden => {}
            Presence::Required => {
                base.properties.insert(key.clone(), schema);
                base.require(key);
            }
            Presence::Optional => base.properties.insert(key.clone(), schema),
        }
    }

    let (local, propagated): (Vec<Condition>, Vec<Condition>) = if root {
        let clamped = conditions.iter().filter(|c| c.up > 1).count();
        if clamped > 0 {
            debug!(path, clamped, "resolving outer conditions at the root scope");
        }
        (conditions, Vec::new())
    } else {
        conditions.into_iter().partition(|c| c.up <= 1)
    };
    let propagated: Vec<Condition> = propagated
        .into_iter()
        .map(|mut c| {
            c.up -= 1;
            c
        })
        .collect();
    if !propagated.is_empty() {
        debug!(path, count = propagated.len(), "propagating conditions to enclosing scope");
    }

    if local.is_empty() && dependencies.is_empty() {
        return Ok(Generated {
            schema: Some(Schema::Object(base)),
            propagated,
        });
    }

    let components = ctx.components;
    let mut axes = condition_axes(local, &declared, components)?;
    axes.extend(resolve_exclusions(dependencies).into_iter().map(Axis::Exclusion));
    debug!(path, axes = axes.len(), "generating alternatives");

    let mut variants = vec![base.clone()];
    for axis in &axes {
        let mut next = Vec::new();
        for variant in &variants {
            match axis {
                Axis::Condition(axis) => {
                    next.extend(condition_options(variant, axis, &declared, components)?)
                }
                Axis::Exclusion(axis) => next.extend(
                    axis.options
                        .iter()
                        .filter_map(|option| exclusion_option(variant, option)),
                ),
            }
        }
        trace!(path, variants = next.len(), "applied axis");
        variants = next;
    }

    let variants = remove_subsumed(variants.into_iter().map(Schema::Object).collect(), components)?;
    debug!(path, variants = variants.len(), "generated alternatives");

    Ok(Generated {
        schema: collapse(variants, &base.meta),
        propagated,
    })
}

/// Group local conditions into axes by reference and test.
fn condition_axes(
    conditions: Vec<Condition>,
    declared: &ObjectSchema,
    components: &Components,
) -> Result<Vec<Axis>, ConvertError> {
    let mut axes: Vec<ConditionAxis> = Vec::new();
    for condition in conditions {
        let member = Member {
            field: condition.field,
            then: condition.then,
            otherwise: condition.otherwise,
        };
        if let Some(axis) = axes
            .iter_mut()
            .find(|a| a.reference == condition.reference && a.test == condition.test)
        {
            axis.members.push(member);
            continue;
        }

        let target = walk(declared, &condition.reference, components)?
            .ok_or_else(|| ConvertError::missing(&condition.origin, condition.raw.clone()))?;
        let leaves = match &condition.test {
            ConditionTest::Exists => vec![Leaf {
                path: condition.reference.clone(),
                shape: target.clone(),
            }],
            ConditionTest::Shape(schema) => {
                let mut leaves = Vec::new();
                decompose(&condition.reference, schema, &mut leaves);
                leaves
            }
        };
        debug!(reference = %condition.raw, leaves = leaves.len(), "new condition axis");
        axes.push(ConditionAxis {
            raw: condition.raw,
            reference: condition.reference,
            test: condition.test,
            leaves,
            members: vec![member],
        });
    }
    Ok(axes.into_iter().map(Axis::Condition).collect())
}

/// Split a test shape into single-field leaves.
fn decompose(path: &[String], shape: &Schema, leaves: &mut Vec<Leaf>) {
    match shape {
        Schema::Object(object) if !object.properties.is_empty() => {
            for (key, child) in object.properties.iter() {
                let mut child_path = path.to_vec();
                child_path.push(key.clone());
                decompose(&child_path, child, leaves);
            }
        }
        _ => leaves.push(Leaf {
            path: path.to_vec(),
            shape: shape.clone(),
        }),
    }
}

/// The positive variant followed by the negative variants of one axis.
fn condition_options(
    variant: &ObjectSchema,
    axis: &ConditionAxis,
    declared: &ObjectSchema,
    components: &Components,
) -> Result<Vec<ObjectSchema>, ConvertError> {
    let mut positive = variant.clone();
    for member in &axis.members {
        positive = apply_outcome(positive, &member.field, member.then.as_ref(), declared, components)?;
    }
    let mut positive = Some(positive);
    for leaf in &axis.leaves {
        let Some(current) = &positive else { break };
        positive = narrow(current, &leaf.path, &leaf.shape, components)?;
    }

    let mut otherwise = variant.clone();
    for member in &axis.members {
        otherwise = apply_outcome(otherwise, &member.field, member.otherwise.as_ref(), declared, components)?;
    }
    let whole = Schema::Object(otherwise);
    let mut negatives = Vec::new();
    for leaf in &axis.leaves {
        let peek = Schema::Object(peek(leaf));
        if let Diffed::Shape(rest) = diff(&whole, &peek, components)? {
            negatives.push(rest);
        }
    }
    let negatives = deduplicate(negatives, components)?;

    if let Some(current) = positive.as_mut() {
        for leaf in &axis.leaves {
            let mut absent = true;
            for negative in negatives.iter().filter_map(Schema::as_object) {
                if walk(negative, &leaf.path, components)?.is_some() {
                    absent = false;
                    break;
                }
            }
            if absent && !negatives.is_empty() {
                *current = require_path(current, &leaf.path, components)?;
            }
        }
    }
    trace!(
        reference = %axis.raw,
        positive = positive.is_some(),
        negatives = negatives.len(),
        "condition options"
    );

    let mut options: Vec<ObjectSchema> = positive.into_iter().collect();
    options.extend(negatives.into_iter().filter_map(|n| match n {
        Schema::Object(object) => Some(object),
        _ => None,
    }));
    Ok(options)
}

fn exclusion_option(variant: &ObjectSchema, option: &ExclusionOption) -> Option<ObjectSchema> {
    let mut object = variant.clone();
    for field in &option.remove {
        object.remove_property(field);
    }
    if option.required {
        if !object.properties.contains_key(&option.keep) {
            return None;
        }
        object.require(&option.keep);
    }
    Some(object)
}

/// The object admitting exactly the instances where `leaf` holds.
fn peek(leaf: &Leaf) -> ObjectSchema {
    let mut segments = leaf.path.iter().rev();
    let mut object = ObjectSchema {
        additional_properties: true,
        ..ObjectSchema::new()
    };
    if let Some(last) = segments.next() {
        object.properties.insert(last.clone(), leaf.shape.clone());
        object.require(last);
    }
    for segment in segments {
        object = ObjectSchema {
            additional_properties: true,
            ..ObjectSchema::new()
        }
        .with_property(segment, Schema::Object(object), true);
    }
    object
}

/// Apply a rule branch to the field at `field`.
fn apply_outcome(
    object: ObjectSchema,
    field: &[String],
    outcome: Option<&Outcome>,
    declared: &ObjectSchema,
    components: &Components,
) -> Result<ObjectSchema, ConvertError> {
    let Some(outcome) = outcome else {
        return Ok(object);
    };
    if outcome.presence == Some(Presence::Forbidden) {
        return update_path(&object, field, components, &mut |container, key| {
            container.remove_property(key);
        });
    }

    let mut object = object;
    if let Some(schema) = &outcome.schema {
        let current = match get_path(&object, field, components)? {
            Some(current) => Some(current),
            None => get_path(declared, field, components)?,
        };
        let merged = match current {
            Some(current) => merge(&current, schema, components)?,
            None => schema.clone(),
        };
        object = update_path(&object, field, components, &mut |container, key| {
            container.properties.insert(key, merged.clone());
        })?;
    }

    match outcome.presence {
        Some(Presence::Required) => {
            if get_path(&object, field, components)?.is_none() {
                if let Some(shape) = get_path(declared, field, components)? {
                    object = update_path(&object, field, components, &mut |container, key| {
                        container.properties.insert(key, shape.clone());
                    })?;
                }
            }
            require_path(&object, field, components)
        }
        Some(Presence::Optional) => update_path(&object, field, components, &mut |container, key| {
            container.unrequire(key);
        }),
        _ => Ok(object),
    }
}

/// Narrow the field at `path` to `shape` and require it.
///
/// Returns `None` when the narrowed variant admits no instance.
fn narrow(
    object: &ObjectSchema,
    path: &[String],
    shape: &Schema,
    components: &Components,
) -> Result<Option<ObjectSchema>, ConvertError> {
    let Some((head, rest)) = path.split_first() else {
        return Ok(Some(object.clone()));
    };
    let mut result = object.clone();
    let Some(current) = object.properties.get(head) else {
        return Ok(None);
    };

    if rest.is_empty() {
        let Some(narrowed) = intersect(current, shape, components)? else {
            return Ok(None);
        };
        result.properties.insert(head.clone(), narrowed);
        result.require(head);
        return Ok(Some(result));
    }

    let narrowed = match expand(current, components)? {
        Schema::Object(inner) => narrow(inner, rest, shape, components)?.map(Schema::Object),
        Schema::Disjunction(disjunction) => {
            let mut branches = Vec::new();
            for branch in &disjunction.branches {
                if let Schema::Object(inner) = expand(branch, components)? {
                    if let Some(narrowed) = narrow(inner, rest, shape, components)? {
                        branches.push(Schema::Object(narrowed));
                    }
                }
            }
            collapse(branches, &disjunction.meta)
        }
        _ => None,
    };
    match narrowed {
        Some(narrowed) => {
            result.properties.insert(head.clone(), narrowed);
            result.require(head);
            Ok(Some(result))
        }
        None => Ok(None),
    }
}

/// Field shape at `path`, unexpanded at the last segment.
fn get_path(
    object: &ObjectSchema,
    path: &[String],
    components: &Components,
) -> Result<Option<Schema>, ConvertError> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(None);
    };
    if parents.is_empty() {
        return Ok(object.properties.get(last).cloned());
    }
    match walk(object, parents, components)? {
        Some(Schema::Object(container)) => Ok(container.properties.get(last).cloned()),
        _ => Ok(None),
    }
}

/// Require every segment of `path`.
fn require_path(
    object: &ObjectSchema,
    path: &[String],
    components: &Components,
) -> Result<ObjectSchema, ConvertError> {
    let mut result = object.clone();
    for end in 1..=path.len() {
        result = update_path(&result, &path[..end], components, &mut |container, key| {
            if container.properties.contains_key(key) {
                container.require(key);
            }
        })?;
    }
    Ok(result)
}

/// Apply `edit` to the object containing the last segment of `path`.
///
/// Object-shaped branches of a nested disjunction are each edited. A missing
/// intermediate leaves the object unchanged.
fn update_path(
    object: &ObjectSchema,
    path: &[String],
    components: &Components,
    edit: &mut dyn FnMut(&mut ObjectSchema, &str),
) -> Result<ObjectSchema, ConvertError> {
    let mut result = object.clone();
    match path {
        [] => {}
        [key] => edit(&mut result, key),
        [head, rest @ ..] => {
            let Some(child) = object.properties.get(head) else {
                return Ok(result);
            };
            let updated = match expand(child, components)? {
                Schema::Object(inner) => Schema::Object(update_path(inner, rest, components, edit)?),
                Schema::Disjunction(disjunction) => {
                    let mut disjunction = disjunction.clone();
                    for branch in &mut disjunction.branches {
                        let edited = match expand(branch, components)? {
                            Schema::Object(inner) => Some(update_path(inner, rest, components, edit)?),
                            _ => None,
                        };
                        if let Some(edited) = edited {
                            *branch = Schema::Object(edited);
                        }
                    }
                    Schema::Disjunction(disjunction)
                }
                _ => return Ok(result),
            };
            result.properties.insert(head.clone(), updated);
        }
    }
    Ok(result)
}

/// Fold a variant list into a single descriptor.
///
/// Several variants become a `oneOf` carrying `meta`. Only the first variant
/// keeps `nullable` so that `null` matches exactly one branch.
fn collapse(variants: Vec<Schema>, meta: &Meta) -> Option<Schema> {
    match variants.len() {
        0 => None,
        1 => variants.into_iter().next(),
        _ => {
            let branches = variants
                .into_iter()
                .enumerate()
                .map(|(i, variant)| match variant {
                    Schema::Object(mut object) => {
                        object.meta = Meta::default();
                        object.nullable = object.nullable && i == 0;
                        Schema::Object(object)
                    }
                    other => other,
                })
                .collect();
            Some(Schema::Disjunction(Disjunction {
                meta: meta.clone(),
                kind: DisjunctionKind::OneOf,
                branches,
            }))
        }
    }
}
