//! Property-based tests for the set and schema algebra.
//!
//! Enum shapes are drawn from a small alphabet so that overlaps, subsets and
//! disjoint pairs all occur often.

use proptest::prelude::*;
use schema_alternatives::{
    covers, diff, intersect, merge, Components, Diffed, ObjectSchema, OrderedSet, Schema,
    StringSchema,
};

fn letters() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d"]), 1..5)
}

fn enum_schema() -> impl Strategy<Value = Schema> {
    letters().prop_map(|values| Schema::String(StringSchema::with_enum(values)))
}

/// Object over `keys`, each property an enum, a random subset required.
fn object_over(keys: &'static [&'static str]) -> impl Strategy<Value = ObjectSchema> {
    prop::collection::vec((prop::sample::select(keys), enum_schema(), any::<bool>()), 0..4).prop_map(
        |fields| {
            fields
                .into_iter()
                .fold(ObjectSchema::new(), |object, (key, schema, required)| {
                    object.with_property(key, schema, required)
                })
        },
    )
}

proptest! {
    #[test]
    fn insert_is_idempotent(values in letters(), extra in prop::sample::select(vec!["a", "e"])) {
        let mut set: OrderedSet<&str> = values.into_iter().collect();
        set.insert(extra);
        let len = set.len();
        prop_assert!(!set.insert(extra));
        prop_assert_eq!(set.len(), len);
    }

    #[test]
    fn union_is_commutative(left in letters(), right in letters()) {
        let left: OrderedSet<&str> = left.into_iter().collect();
        let right: OrderedSet<&str> = right.into_iter().collect();
        prop_assert_eq!(left.union(&right), right.union(&left));
    }

    #[test]
    fn merge_commutes_on_disjoint_objects(
        left in object_over(&["id", "code", "text"]),
        right in object_over(&["name", "kind"]),
    ) {
        let components = Components::new();
        let a = Schema::Object(left);
        let b = Schema::Object(right);
        prop_assert_eq!(
            merge(&a, &b, &components).unwrap(),
            merge(&b, &a, &components).unwrap()
        );
    }

    #[test]
    fn diff_with_itself_is_empty(schema in enum_schema()) {
        let components = Components::new();
        prop_assert!(matches!(diff(&schema, &schema, &components).unwrap(), Diffed::Empty));
    }

    #[test]
    fn diff_is_disjoint_from_subtrahend(a in enum_schema(), b in enum_schema()) {
        let components = Components::new();
        if let Diffed::Shape(rest) = diff(&a, &b, &components).unwrap() {
            prop_assert!(covers(&a, &rest, &components).unwrap());
            prop_assert!(intersect(&rest, &b, &components).unwrap().is_none());
        }
    }

    #[test]
    fn intersection_is_covered_by_both(a in enum_schema(), b in enum_schema()) {
        let components = Components::new();
        if let Some(inside) = intersect(&a, &b, &components).unwrap() {
            prop_assert!(covers(&a, &inside, &components).unwrap());
            prop_assert!(covers(&b, &inside, &components).unwrap());
        }
    }
}
