//! Schema Alternatives
//!
//! Flattens conditional validation descriptions into exclusive object variants.
//!
//! A description may make one field's shape or presence depend on another
//! field (`whens`), or declare that peer fields exclude each other (`nand`,
//! `xor`). Declarative schema languages such as OpenAPI cannot express these
//! rules directly, so each conditional object is rewritten into a `oneOf` of
//! plain object variants that together admit exactly the same instances.
//!
//! # Example
//!
//! ```
//! use schema_alternatives::{convert_document, ConvertOptions};
//! use serde_json::json;
//!
//! let description = json!({
//!     "type": "object",
//!     "keys": {
//!         "method": { "type": "string", "allow": ["in", "out"] },
//!         "duration": {
//!             "type": "number",
//!             "whens": [{
//!                 "ref": "method",
//!                 "is": { "type": "string", "allow": ["in"] },
//!                 "then": { "type": "any", "presence": "required" },
//!                 "otherwise": { "type": "any", "presence": "forbidden" }
//!             }]
//!         }
//!     }
//! });
//!
//! let schema = convert_document(&description, &ConvertOptions::new()).unwrap();
//! let variants = schema["oneOf"].as_array().unwrap();
//!
//! // "in" requires a duration; "out" may not carry one
//! assert_eq!(variants.len(), 2);
//! assert_eq!(variants[0]["properties"]["method"]["enum"], json!(["in"]));
//! assert_eq!(variants[0]["required"], json!(["duration", "method"]));
//! assert!(variants[1]["properties"].get("duration").is_none());
//! ```
//!
//! # Rules
//!
//! | Rule | Effect |
//! |------|--------|
//! | `whens` with `is` | one variant where the test holds, others where it fails |
//! | `whens` without `is` | the referenced field exists or is absent |
//! | `nand` | at most one peer per variant |
//! | `xor` | exactly one peer per variant |
//!
//! # References
//!
//! Rule references are dotted paths. A bare path (`method`) or `..method`
//! addresses a sibling of the conditioned field, `.kind` one of its own
//! children, and each further leading dot climbs one enclosing object.

mod algebra;
mod alternatives;
mod components;
mod converter;
mod description;
mod error;
mod exclusion;
mod loader;
mod reference;
mod schema;
mod sets;
mod types;

pub use algebra::{
    covers, deduplicate, diff, intersect, merge, overlap_subtract, remove_subsumed, Diffed,
    Subtracted,
};
pub use components::{split_component_name, Components};
pub use converter::{
    convert, convert_components, convert_document, variant_count, ConvertContext, Document,
};
pub use description::{Description, Kind, Test, When};
pub use error::{ConvertError, LoadError};
pub use exclusion::{
    not_allowed_combinations, resolve_exclusions, Dependencies, Exclusion, ExclusionAxis,
    ExclusionOption,
};
pub use loader::{is_url, load_description, load_description_auto, load_description_str};
pub use reference::{resolve, Reference};
pub use schema::{
    ArraySchema, BooleanSchema, Disjunction, DisjunctionKind, Meta, NumberSchema, ObjectSchema,
    Properties, ReferenceSchema, Schema, StringSchema,
};
pub use sets::{field_set, FieldSet, FieldSets, OrderedSet};
pub use types::{ConvertOptions, ExclusionMode, Presence};

#[cfg(feature = "remote")]
pub use loader::load_description_url;
