//! Structural algebra over schema descriptors.
//!
//! - [`merge`] combines two shapes of the same tag.
//! - [`diff`] computes what is still possible for one shape once another is
//!   excluded.
//! - [`covers`] is the subsumption test ("every instance of `narrow` matches
//!   `wide`").
//! - [`intersect`] narrows a shape to the part another shape allows.
//! - [`overlap_subtract`] removes the territory of an earlier variant from a
//!   later one, used to keep generated variants exclusive.
//!
//! Every operation dereferences `reference` descriptors against the component
//! table first and returns fully expanded results.

use serde_json::Number;
use tracing::trace;

use crate::components::Components;
use crate::error::ConvertError;
use crate::schema::{
    ArraySchema, Disjunction, NumberSchema, ObjectSchema, Schema, StringSchema,
};
use crate::sets::OrderedSet;

/// Result of [`diff`].
#[derive(Debug, Clone, PartialEq)]
pub enum Diffed {
    /// Nothing remains: the branch is no longer representable and is dropped.
    Empty,
    Shape(Schema),
}

/// Result of [`overlap_subtract`].
#[derive(Debug, Clone, PartialEq)]
pub enum Subtracted {
    /// The candidate adds nothing beyond what was already covered.
    Empty,
    /// The candidate lost the overlapping territory.
    Reduced(Schema),
    /// The overlap could not be expressed; the candidate is kept as-is.
    Unchanged,
}

/// Follow reference descriptors until a concrete shape is reached.
pub fn expand<'s>(schema: &'s Schema, components: &'s Components) -> Result<&'s Schema, ConvertError> {
    let mut current = schema;
    let mut hops = 0;
    while let Schema::Reference(reference) = current {
        if hops > components.len() {
            return Err(ConvertError::missing(
                "#/components",
                format!("{}/{} (reference cycle)", reference.collection, reference.name),
            ));
        }
        current = components.lookup(reference).ok_or_else(|| {
            ConvertError::missing(
                "#/components",
                format!("{}/{}", reference.collection, reference.name),
            )
        })?;
        hops += 1;
    }
    Ok(current)
}

// --- merge ---

/// Combine two shapes of the same tag.
///
/// Objects merge key-wise and union `required`; string and number enums are
/// unioned; `nullable` holds if either side holds. Different tags, or two
/// different formats, are an [`ConvertError::IncompatibleMerge`].
pub fn merge(left: &Schema, right: &Schema, components: &Components) -> Result<Schema, ConvertError> {
    let left = expand(left, components)?;
    let right = expand(right, components)?;
    trace!(left = left.tag(), right = right.tag(), "merge");

    match (left, right) {
        (Schema::Object(a), Schema::Object(b)) => {
            let mut merged = a.clone();
            for (key, schema) in b.properties.iter() {
                let value = match a.properties.get(key) {
                    Some(existing) => merge(existing, schema, components)?,
                    None => schema.clone(),
                };
                merged.properties.insert(key.clone(), value);
            }
            merged.required = a.required.union(&b.required);
            merged.additional_properties = a.additional_properties || b.additional_properties;
            merged.nullable = a.nullable || b.nullable;
            merged.meta = a.meta.or(&b.meta);
            Ok(Schema::Object(merged))
        }
        (Schema::String(a), Schema::String(b)) => Ok(Schema::String(StringSchema {
            meta: a.meta.or(&b.meta),
            enumeration: union_enum(&a.enumeration, &b.enumeration),
            not_enum: a.not_enum.union(&b.not_enum),
            pattern: b.pattern.clone().or_else(|| a.pattern.clone()),
            format: merge_format("string", &a.format, &b.format)?,
            min_length: b.min_length.or(a.min_length),
            max_length: b.max_length.or(a.max_length),
            nullable: a.nullable || b.nullable,
        })),
        (Schema::Number(a), Schema::Number(b)) => Ok(Schema::Number(NumberSchema {
            meta: a.meta.or(&b.meta),
            enumeration: union_enum(&a.enumeration, &b.enumeration),
            not_enum: a.not_enum.union(&b.not_enum),
            minimum: b.minimum.clone().or_else(|| a.minimum.clone()),
            maximum: b.maximum.clone().or_else(|| a.maximum.clone()),
            integer: a.integer || b.integer,
            format: merge_format("number", &a.format, &b.format)?,
            nullable: a.nullable || b.nullable,
        })),
        (Schema::Boolean(a), Schema::Boolean(b)) => {
            let mut merged = a.clone();
            merged.nullable = a.nullable || b.nullable;
            merged.meta = a.meta.or(&b.meta);
            Ok(Schema::Boolean(merged))
        }
        (Schema::Array(a), Schema::Array(b)) => Ok(Schema::Array(ArraySchema {
            meta: a.meta.or(&b.meta),
            items: Box::new(merge(&a.items, &b.items, components)?),
            min_items: b.min_items.or(a.min_items),
            max_items: b.max_items.or(a.max_items),
            nullable: a.nullable || b.nullable,
        })),
        (Schema::Disjunction(a), Schema::Disjunction(b)) if a.kind == b.kind => {
            let mut branches = a.branches.clone();
            branches.extend(b.branches.iter().cloned());
            Ok(Schema::Disjunction(Disjunction {
                meta: a.meta.or(&b.meta),
                kind: a.kind,
                branches,
            }))
        }
        (a, b) => Err(ConvertError::IncompatibleMerge {
            left: a.tag().to_string(),
            right: b.tag().to_string(),
        }),
    }
}

fn union_enum<T: PartialEq + Clone>(
    a: &Option<OrderedSet<T>>,
    b: &Option<OrderedSet<T>>,
) -> Option<OrderedSet<T>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (None, None) => None,
    }
}

fn merge_format(
    tag: &str,
    a: &Option<String>,
    b: &Option<String>,
) -> Result<Option<String>, ConvertError> {
    match (a, b) {
        (Some(a), Some(b)) if a != b => Err(ConvertError::IncompatibleMerge {
            left: format!("{} format {}", tag, a),
            right: format!("{} format {}", tag, b),
        }),
        _ => Ok(b.clone().or_else(|| a.clone())),
    }
}

// --- covers ---

/// True when every instance matching `narrow` also matches `wide`.
///
/// Conservative: returns false whenever inclusion cannot be shown
/// structurally.
pub fn covers(wide: &Schema, narrow: &Schema, components: &Components) -> Result<bool, ConvertError> {
    let wide = expand(wide, components)?;
    let narrow = expand(narrow, components)?;

    match (wide, narrow) {
        (_, Schema::Disjunction(n)) if n.kind != crate::schema::DisjunctionKind::AllOf => {
            for branch in &n.branches {
                if !covers(wide, branch, components)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Schema::Disjunction(w), _) if w.kind != crate::schema::DisjunctionKind::AllOf => {
            for branch in &w.branches {
                if covers(branch, narrow, components)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        (Schema::Object(w), Schema::Object(n)) => covers_object(w, n, components),
        (Schema::String(w), Schema::String(n)) => Ok(covers_string(w, n)),
        (Schema::Number(w), Schema::Number(n)) => Ok(covers_number(w, n)),
        (Schema::Boolean(w), Schema::Boolean(n)) => Ok(w.nullable || !n.nullable),
        (Schema::Array(w), Schema::Array(n)) => Ok((w.nullable || !n.nullable)
            && bound_at_least(w.min_items, n.min_items)
            && bound_at_most(w.max_items, n.max_items)
            && covers(&w.items, &n.items, components)?),
        (w, n) => Ok(w == n),
    }
}

fn covers_object(
    wide: &ObjectSchema,
    narrow: &ObjectSchema,
    components: &Components,
) -> Result<bool, ConvertError> {
    if (narrow.nullable && !wide.nullable)
        || (narrow.additional_properties && !wide.additional_properties)
        || !wide.required.is_subset(&narrow.required)
    {
        return Ok(false);
    }
    for (key, schema) in narrow.properties.iter() {
        match wide.properties.get(key) {
            Some(wide_schema) => {
                if !covers(wide_schema, schema, components)? {
                    return Ok(false);
                }
            }
            None if !wide.additional_properties => return Ok(false),
            None => {}
        }
    }
    Ok(true)
}

/// Does `schema` reject `value` through its enum or negative enum?
fn excludes<T: PartialEq>(enumeration: &Option<OrderedSet<T>>, not_enum: &OrderedSet<T>, value: &T) -> bool {
    not_enum.contains(value)
        || enumeration
            .as_ref()
            .map(|values| !values.contains(value))
            .unwrap_or(false)
}

fn covers_enum<T: PartialEq>(
    wide_enum: &Option<OrderedSet<T>>,
    wide_not: &OrderedSet<T>,
    narrow_enum: &Option<OrderedSet<T>>,
    narrow_not: &OrderedSet<T>,
) -> bool {
    let enum_ok = match (wide_enum, narrow_enum) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(wide), Some(narrow)) => narrow
            .iter()
            .all(|value| wide.contains(value) || narrow_not.contains(value)),
    };
    enum_ok
        && wide_not
            .iter()
            .all(|value| excludes(narrow_enum, narrow_not, value))
}

fn covers_string(wide: &StringSchema, narrow: &StringSchema) -> bool {
    (wide.nullable || !narrow.nullable)
        && covers_enum(
            &wide.enumeration,
            &wide.not_enum,
            &narrow.enumeration,
            &narrow.not_enum,
        )
        && (wide.pattern.is_none() || wide.pattern == narrow.pattern)
        && (wide.format.is_none() || wide.format == narrow.format)
        && bound_at_least(wide.min_length, narrow.min_length)
        && bound_at_most(wide.max_length, narrow.max_length)
}

fn covers_number(wide: &NumberSchema, narrow: &NumberSchema) -> bool {
    (wide.nullable || !narrow.nullable)
        && (!wide.integer || narrow.integer)
        && covers_enum(
            &wide.enumeration,
            &wide.not_enum,
            &narrow.enumeration,
            &narrow.not_enum,
        )
        && (wide.format.is_none() || wide.format == narrow.format)
        && number_at_least(&wide.minimum, &narrow.minimum)
        && number_at_most(&wide.maximum, &narrow.maximum)
}

/// A lower bound on `wide` is no stricter than the one on `narrow`.
fn bound_at_least(wide: Option<u64>, narrow: Option<u64>) -> bool {
    match (wide, narrow) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(w), Some(n)) => n >= w,
    }
}

fn bound_at_most(wide: Option<u64>, narrow: Option<u64>) -> bool {
    match (wide, narrow) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(w), Some(n)) => n <= w,
    }
}

fn number_at_least(wide: &Option<Number>, narrow: &Option<Number>) -> bool {
    match (wide.as_ref().and_then(Number::as_f64), narrow.as_ref().and_then(Number::as_f64)) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(w), Some(n)) => n >= w,
    }
}

fn number_at_most(wide: &Option<Number>, narrow: &Option<Number>) -> bool {
    match (wide.as_ref().and_then(Number::as_f64), narrow.as_ref().and_then(Number::as_f64)) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(w), Some(n)) => n <= w,
    }
}

// --- diff ---

/// What is still possible for `a` once everything `b` allows is excluded.
///
/// Objects are walked along `b`'s properties; a property whose remainder is
/// empty is dropped from `properties` and `required`. String and number enums
/// are subtracted; an unrestricted `a` records `b`'s values as a negative
/// enum instead. Shapes of different tags do not overlap and leave `a` as-is.
pub fn diff(a: &Schema, b: &Schema, components: &Components) -> Result<Diffed, ConvertError> {
    let a = expand(a, components)?;
    let b = expand(b, components)?;
    trace!(left = a.tag(), right = b.tag(), "diff");

    if covers(b, a, components)? {
        return Ok(Diffed::Empty);
    }

    match (a, b) {
        (Schema::Disjunction(d), _) => {
            let mut branches = Vec::new();
            for branch in &d.branches {
                if let Diffed::Shape(rest) = diff(branch, b, components)? {
                    branches.push(rest);
                }
            }
            if branches.is_empty() {
                return Ok(Diffed::Empty);
            }
            Ok(Diffed::Shape(Schema::Disjunction(Disjunction {
                branches,
                ..d.clone()
            })))
        }
        (_, Schema::Disjunction(d)) => {
            let mut current = a.clone();
            for branch in &d.branches {
                match diff(&current, branch, components)? {
                    Diffed::Empty => return Ok(Diffed::Empty),
                    Diffed::Shape(rest) => current = rest,
                }
            }
            Ok(Diffed::Shape(current))
        }
        (Schema::Object(a), Schema::Object(b)) => {
            let mut result = a.clone();
            for (key, excluded) in b.properties.iter() {
                let Some(current) = a.properties.get(key) else {
                    continue;
                };
                match diff(current, excluded, components)? {
                    Diffed::Empty => {
                        result.remove_property(key);
                    }
                    Diffed::Shape(rest) => result.properties.insert(key.clone(), rest),
                }
            }
            Ok(Diffed::Shape(Schema::Object(result)))
        }
        (Schema::String(a), Schema::String(b)) => {
            let rest = subtract_enum(&a.enumeration, &a.not_enum, &b.enumeration, &b.not_enum);
            Ok(match rest {
                EnumRest::Empty => Diffed::Empty,
                EnumRest::Unchanged => Diffed::Shape(Schema::String(a.clone())),
                EnumRest::Values(enumeration, not_enum) => Diffed::Shape(Schema::String(StringSchema {
                    enumeration,
                    not_enum,
                    ..a.clone()
                })),
            })
        }
        (Schema::Number(a), Schema::Number(b)) => {
            let rest = subtract_enum(&a.enumeration, &a.not_enum, &b.enumeration, &b.not_enum);
            Ok(match rest {
                EnumRest::Empty => Diffed::Empty,
                EnumRest::Unchanged => Diffed::Shape(Schema::Number(a.clone())),
                EnumRest::Values(enumeration, not_enum) => Diffed::Shape(Schema::Number(NumberSchema {
                    enumeration,
                    not_enum,
                    ..a.clone()
                })),
            })
        }
        (a, _) => Ok(Diffed::Shape(a.clone())),
    }
}

enum EnumRest<T> {
    Empty,
    Unchanged,
    Values(Option<OrderedSet<T>>, OrderedSet<T>),
}

/// Subtract the values `b` allows from the values `a` allows.
fn subtract_enum<T: PartialEq + Clone>(
    a_enum: &Option<OrderedSet<T>>,
    a_not: &OrderedSet<T>,
    b_enum: &Option<OrderedSet<T>>,
    b_not: &OrderedSet<T>,
) -> EnumRest<T> {
    match (a_enum, b_enum) {
        (Some(values), Some(excluded)) => {
            let rest = values.difference(excluded).difference(a_not);
            if rest.is_empty() {
                EnumRest::Empty
            } else if rest.len() == values.len() {
                EnumRest::Unchanged
            } else {
                EnumRest::Values(Some(rest), a_not.clone())
            }
        }
        (None, Some(excluded)) => {
            let not_enum = a_not.union(excluded);
            if not_enum.len() == a_not.len() {
                EnumRest::Unchanged
            } else {
                EnumRest::Values(None, not_enum)
            }
        }
        // `b` allows everything except `b_not`: only those values remain
        (Some(values), None) if !b_not.is_empty() => {
            let rest = values.intersection(b_not);
            if rest.is_empty() {
                EnumRest::Empty
            } else if rest.len() == values.len() {
                EnumRest::Unchanged
            } else {
                EnumRest::Values(Some(rest), a_not.clone())
            }
        }
        (None, None) if !b_not.is_empty() => {
            let rest = b_not.difference(a_not);
            if rest.is_empty() {
                EnumRest::Empty
            } else {
                EnumRest::Values(Some(rest), OrderedSet::new())
            }
        }
        _ => EnumRest::Unchanged,
    }
}

// --- intersect ---

/// The part of `a` that `b` also allows, or `None` when they are disjoint.
///
/// Leaf shapes use `diff(a, diff(a, b))`; objects intersect key-wise.
pub fn intersect(a: &Schema, b: &Schema, components: &Components) -> Result<Option<Schema>, ConvertError> {
    let a = expand(a, components)?;
    let b = expand(b, components)?;

    match (a, b) {
        (Schema::Disjunction(d), _) => {
            let mut branches = Vec::new();
            for branch in &d.branches {
                if let Some(inside) = intersect(branch, b, components)? {
                    branches.push(inside);
                }
            }
            Ok(match branches.len() {
                0 => None,
                1 => branches.pop(),
                _ => Some(Schema::Disjunction(Disjunction {
                    branches,
                    ..d.clone()
                })),
            })
        }
        (Schema::Object(left), Schema::Object(right)) => {
            let mut result = left.clone();
            for (key, schema) in right.properties.iter() {
                let narrowed = match left.properties.get(key) {
                    Some(existing) => match intersect(existing, schema, components)? {
                        Some(narrowed) => narrowed,
                        None => return Ok(None),
                    },
                    None => schema.clone(),
                };
                result.properties.insert(key.clone(), narrowed);
            }
            result.required = left.required.union(&right.required);
            Ok(Some(Schema::Object(result)))
        }
        _ => match diff(a, b, components)? {
            Diffed::Empty => Ok(Some(a.clone())),
            Diffed::Shape(outside) => match diff(a, &outside, components)? {
                Diffed::Empty => Ok(None),
                Diffed::Shape(inside) => Ok(Some(inside)),
            },
        },
    }
}

// --- overlap-subtract ---

/// Remove from `candidate` the territory `covered` already describes.
///
/// Only overlaps confined to a single property can be expressed; anything
/// else leaves the candidate [`Subtracted::Unchanged`]. Enum arithmetic is
/// applied to strings only; number enums are compared for subsumption but
/// never reduced.
pub fn overlap_subtract(
    candidate: &Schema,
    covered: &Schema,
    components: &Components,
) -> Result<Subtracted, ConvertError> {
    let candidate = expand(candidate, components)?;
    let covered = expand(covered, components)?;

    if covers(covered, candidate, components)? {
        return Ok(Subtracted::Empty);
    }

    match (candidate, covered) {
        (Schema::Object(c), Schema::Object(v)) => subtract_object(c, v, components),
        (Schema::String(c), Schema::String(v)) => Ok(subtract_string(c, v)),
        _ => Ok(Subtracted::Unchanged),
    }
}

fn subtract_string(candidate: &StringSchema, covered: &StringSchema) -> Subtracted {
    // Enum arithmetic is only sound when the rest of `covered` is no stricter.
    let loose = StringSchema {
        enumeration: None,
        not_enum: OrderedSet::new(),
        ..covered.clone()
    };
    if !covers_string(&loose, candidate) {
        return Subtracted::Unchanged;
    }
    match subtract_enum(
        &candidate.enumeration,
        &candidate.not_enum,
        &covered.enumeration,
        &covered.not_enum,
    ) {
        EnumRest::Empty => Subtracted::Empty,
        EnumRest::Unchanged => Subtracted::Unchanged,
        EnumRest::Values(enumeration, not_enum) => Subtracted::Reduced(Schema::String(StringSchema {
            enumeration,
            not_enum,
            ..candidate.clone()
        })),
    }
}

/// Is `covered`'s territory on `key` a superset of `candidate`'s?
fn key_covered(
    key: &str,
    candidate: &ObjectSchema,
    covered: &ObjectSchema,
    components: &Components,
) -> Result<bool, ConvertError> {
    let candidate_absent = !candidate.is_required(key);
    if candidate_absent && covered.is_required(key) {
        return Ok(false);
    }
    match (candidate.properties.get(key), covered.properties.get(key)) {
        (Some(c), Some(v)) => covers(v, c, components),
        (Some(_), None) => Ok(covered.additional_properties),
        (None, Some(_)) => Ok(!candidate.additional_properties),
        (None, None) => Ok(!candidate.additional_properties || covered.additional_properties),
    }
}

fn subtract_object(
    candidate: &ObjectSchema,
    covered: &ObjectSchema,
    components: &Components,
) -> Result<Subtracted, ConvertError> {
    if (candidate.additional_properties && !covered.additional_properties)
        || (candidate.nullable && !covered.nullable)
    {
        return Ok(Subtracted::Unchanged);
    }

    let keys: OrderedSet<&String> = candidate
        .properties
        .keys()
        .chain(covered.properties.keys())
        .chain(candidate.required.iter())
        .chain(covered.required.iter())
        .collect();
    let mut differing = Vec::new();
    for key in keys {
        if !key_covered(key, candidate, covered, components)? {
            differing.push(key.clone());
        }
    }

    let [key] = differing.as_slice() else {
        return Ok(Subtracted::Unchanged);
    };
    let Some(current) = candidate.properties.get(key) else {
        return Ok(Subtracted::Unchanged);
    };

    // Both allow the key to be absent: the absent case is shared.
    let absent_shared = !candidate.is_required(key) && !covered.is_required(key);

    let present = match covered.properties.get(key) {
        Some(excluded) => overlap_subtract(current, excluded, components)?,
        None if covered.additional_properties => Subtracted::Empty,
        None => Subtracted::Unchanged,
    };

    let mut result = candidate.clone();
    match present {
        Subtracted::Empty => {
            if absent_shared || candidate.is_required(key) || candidate.additional_properties {
                return Ok(Subtracted::Unchanged);
            }
            // Only absence remains
            result.remove_property(key);
        }
        Subtracted::Reduced(rest) => {
            result.properties.insert(key.clone(), rest);
            if absent_shared {
                result.require(key);
            }
        }
        Subtracted::Unchanged => {
            if !absent_shared {
                return Ok(Subtracted::Unchanged);
            }
            result.require(key);
        }
    }
    trace!(key = key.as_str(), "overlap reduced to a single property");
    Ok(Subtracted::Reduced(Schema::Object(result)))
}

/// Make a list of variants exclusive.
///
/// Keeps the first variant, subtracts its territory from every later one and
/// drops later variants reduced to nothing; repeats until the list is stable.
pub fn deduplicate(variants: Vec<Schema>, components: &Components) -> Result<Vec<Schema>, ConvertError> {
    let mut current = variants;
    // Each pass can only shrink or narrow variants; the bound is a safety net.
    for _ in 0..=current.len() {
        let mut next: Vec<Schema> = Vec::with_capacity(current.len());
        for candidate in &current {
            let mut remaining = Some(candidate.clone());
            for earlier in &next {
                let Some(schema) = remaining.take() else {
                    break;
                };
                remaining = match overlap_subtract(&schema, earlier, components)? {
                    Subtracted::Empty => None,
                    Subtracted::Reduced(rest) => Some(rest),
                    Subtracted::Unchanged => Some(schema),
                };
            }
            if let Some(schema) = remaining {
                next.push(schema);
            }
        }
        if next == current {
            break;
        }
        current = next;
    }
    Ok(current)
}

/// Drop every variant fully covered by an earlier one.
pub fn remove_subsumed(variants: Vec<Schema>, components: &Components) -> Result<Vec<Schema>, ConvertError> {
    let mut kept: Vec<Schema> = Vec::with_capacity(variants.len());
    'variants: for variant in variants {
        for earlier in &kept {
            if covers(earlier, &variant, components)? {
                continue 'variants;
            }
        }
        kept.push(variant);
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BooleanSchema, ReferenceSchema};

    fn string() -> Schema {
        Schema::String(StringSchema::new())
    }

    fn strings(values: &[&str]) -> Schema {
        Schema::String(StringSchema::with_enum(values.iter().copied()))
    }

    fn object(props: &[(&str, Schema)], required: &[&str]) -> Schema {
        let mut object = ObjectSchema::new();
        for (key, schema) in props {
            object.properties.insert(*key, schema.clone());
        }
        for key in required {
            object.require(key);
        }
        Schema::Object(object)
    }

    fn none() -> Components {
        Components::new()
    }

    // === merge ===

    #[test]
    fn merge_objects_combines_keys_and_required() {
        let a = object(&[("id", string())], &["id"]);
        let b = object(&[("name", string())], &["name"]);
        let merged = merge(&a, &b, &none()).unwrap();
        let merged = merged.as_object().unwrap();
        assert!(merged.properties.contains_key("id"));
        assert!(merged.properties.contains_key("name"));
        assert!(merged.is_required("id") && merged.is_required("name"));
    }

    #[test]
    fn merge_unions_string_enums() {
        let merged = merge(&strings(&["a", "b"]), &strings(&["b", "c"]), &none()).unwrap();
        assert_eq!(merged, strings(&["a", "b", "c"]));
    }

    #[test]
    fn merge_nullable_is_either() {
        let mut nullable = StringSchema::new();
        nullable.nullable = true;
        let merged = merge(&string(), &Schema::String(nullable), &none()).unwrap();
        assert!(matches!(merged, Schema::String(s) if s.nullable));
    }

    #[test]
    fn merge_different_tags_fails() {
        let result = merge(&string(), &Schema::Number(NumberSchema::new()), &none());
        assert!(matches!(
            result,
            Err(ConvertError::IncompatibleMerge { left, right }) if left == "string" && right == "number"
        ));
    }

    #[test]
    fn merge_conflicting_formats_fails() {
        let a = Schema::String(StringSchema {
            format: Some("date-time".into()),
            ..StringSchema::new()
        });
        let b = Schema::String(StringSchema {
            format: Some("binary".into()),
            ..StringSchema::new()
        });
        assert!(matches!(
            merge(&a, &b, &none()),
            Err(ConvertError::IncompatibleMerge { .. })
        ));
    }

    #[test]
    fn merge_expands_references() {
        let mut components = Components::new();
        components.register("schemas", "Flag", Schema::Boolean(BooleanSchema::default()));
        let reference = Schema::Reference(ReferenceSchema {
            collection: "schemas".into(),
            name: "Flag".into(),
        });
        let merged = merge(&reference, &Schema::Boolean(BooleanSchema::default()), &components).unwrap();
        assert_eq!(merged.tag(), "boolean");
    }

    #[test]
    fn merge_missing_reference_fails() {
        let reference = Schema::Reference(ReferenceSchema {
            collection: "schemas".into(),
            name: "Nope".into(),
        });
        assert!(matches!(
            merge(&reference, &string(), &none()),
            Err(ConvertError::MissingReferenceTarget { .. })
        ));
    }

    // === diff ===

    #[test]
    fn diff_identical_enums_is_empty() {
        let result = diff(&strings(&["a", "b"]), &strings(&["a", "b"]), &none()).unwrap();
        assert_eq!(result, Diffed::Empty);
    }

    #[test]
    fn diff_subtracts_enum_values() {
        let result = diff(&strings(&["in", "out"]), &strings(&["in"]), &none()).unwrap();
        assert_eq!(result, Diffed::Shape(strings(&["out"])));
    }

    #[test]
    fn diff_unrestricted_records_negative_enum() {
        let result = diff(&string(), &strings(&["in"]), &none()).unwrap();
        let Diffed::Shape(Schema::String(rest)) = result else {
            panic!("expected a string shape");
        };
        assert!(rest.enumeration.is_none());
        assert_eq!(rest.not_enum.as_slice(), ["in"]);
    }

    #[test]
    fn diff_drops_emptied_required_property() {
        let a = object(&[("kind", strings(&["x"])), ("id", string())], &["kind", "id"]);
        let b = object(&[("kind", strings(&["x"]))], &[]);
        let Diffed::Shape(Schema::Object(rest)) = diff(&a, &b, &none()).unwrap() else {
            panic!("expected an object shape");
        };
        assert!(!rest.properties.contains_key("kind"));
        assert!(!rest.is_required("kind"));
        assert!(rest.is_required("id"));
    }

    #[test]
    fn diff_leaves_unrelated_properties() {
        let a = object(&[("id", string())], &[]);
        let b = object(&[("other", string())], &[]);
        assert_eq!(diff(&a, &b, &none()).unwrap(), Diffed::Shape(a));
    }

    // === covers / intersect ===

    #[test]
    fn covers_enum_inclusion() {
        assert!(covers(&strings(&["a", "b"]), &strings(&["a"]), &none()).unwrap());
        assert!(!covers(&strings(&["a"]), &strings(&["a", "b"]), &none()).unwrap());
        assert!(covers(&string(), &strings(&["a"]), &none()).unwrap());
    }

    #[test]
    fn covers_object_required() {
        let loose = object(&[("id", string())], &[]);
        let strict = object(&[("id", string())], &["id"]);
        assert!(covers(&loose, &strict, &none()).unwrap());
        assert!(!covers(&strict, &loose, &none()).unwrap());
    }

    #[test]
    fn intersect_narrows_existing_enum() {
        let narrowed = intersect(&strings(&["in", "out"]), &strings(&["in"]), &none()).unwrap();
        assert_eq!(narrowed, Some(strings(&["in"])));
    }

    #[test]
    fn intersect_unrestricted_takes_other_enum() {
        let narrowed = intersect(&string(), &strings(&["in"]), &none()).unwrap();
        assert_eq!(narrowed, Some(strings(&["in"])));
    }

    #[test]
    fn intersect_disjoint_is_none() {
        let narrowed = intersect(&strings(&["out"]), &strings(&["in"]), &none()).unwrap();
        assert_eq!(narrowed, None);
    }

    // === overlap-subtract ===

    #[test]
    fn overlap_subtract_drops_subsumed() {
        let earlier = object(&[("a", string())], &[]);
        let later = object(&[("a", strings(&["x"]))], &[]);
        assert_eq!(
            overlap_subtract(&later, &earlier, &none()).unwrap(),
            Subtracted::Empty
        );
    }

    #[test]
    fn overlap_subtract_single_property() {
        let mut not_x = StringSchema::new();
        not_x.not_enum.insert("x".into());
        let mut not_y = StringSchema::new();
        not_y.not_enum.insert("y".into());
        let earlier = object(&[("a", Schema::String(not_x)), ("b", string())], &[]);
        let later = object(&[("a", string()), ("b", Schema::String(not_y.clone()))], &[]);

        let Subtracted::Reduced(Schema::Object(rest)) = overlap_subtract(&later, &earlier, &none()).unwrap() else {
            panic!("expected a reduced object");
        };
        assert_eq!(rest.properties.get("a"), Some(&strings(&["x"])));
        assert!(rest.is_required("a"));
        assert_eq!(rest.properties.get("b"), Some(&Schema::String(not_y)));
    }

    #[test]
    fn overlap_subtract_multiple_properties_unchanged() {
        let earlier = object(&[("a", strings(&["x"])), ("b", strings(&["y"]))], &[]);
        let later = object(&[("a", string()), ("b", string())], &[]);
        assert_eq!(
            overlap_subtract(&later, &earlier, &none()).unwrap(),
            Subtracted::Unchanged
        );
    }

    #[test]
    fn deduplicate_removes_repeats() {
        let variant = object(&[("id", string())], &[]);
        let result = deduplicate(vec![variant.clone(), variant.clone()], &none()).unwrap();
        assert_eq!(result, vec![variant]);
    }

    #[test]
    fn remove_subsumed_keeps_disjoint() {
        let a = object(&[("id", string()), ("text", string())], &[]);
        let b = object(&[("id", string()), ("code", string())], &[]);
        let result = remove_subsumed(vec![a.clone(), b.clone()], &none()).unwrap();
        assert_eq!(result, vec![a, b]);
    }
}
