//! Core types for schema conversion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Built-in description type tags.
pub const BUILTIN_KINDS: &[&str] = &[
    "any",
    "alternatives",
    "array",
    "binary",
    "boolean",
    "date",
    "link",
    "number",
    "object",
    "string",
];

/// Component collection used when a link names no collection.
pub const DEFAULT_COLLECTION: &str = "schemas";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Presence of a field inside its parent object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// Field may be present or absent.
    #[default]
    Optional,
    /// Field must be present.
    Required,
    /// Field must be absent.
    Forbidden,
}

impl Presence {
    /// Parse a presence flag from a string.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "optional" => Some(Presence::Optional),
            "required" => Some(Presence::Required),
            "forbidden" => Some(Presence::Forbidden),
            _ => None,
        }
    }
}

/// Mode of a mutual-exclusion relation between peer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExclusionMode {
    /// At most one of the peers may be present.
    Nand,
    /// Exactly one of the peers must be present.
    Xor,
}

impl ExclusionMode {
    /// Parse a relation name (`nand` or `xor`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nand" => Some(ExclusionMode::Nand),
            "xor" => Some(ExclusionMode::Xor),
            _ => None,
        }
    }
}

/// Options for schema conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// When false (default), object schemas get `additionalProperties: false`
    /// unless the description sets `unknown: true`.
    pub allow_unknown: bool,
    /// Separator between reference path segments.
    pub separator: char,
    /// Prefix of emitted `$ref` pointers.
    pub component_prefix: String,
    /// Extension type tags mapped to the tag they are built on.
    pub aliases: HashMap<String, String>,
}

impl ConvertOptions {
    /// Create options with unknown keys rejected and `.` as the path separator.
    pub fn new() -> Self {
        Self {
            allow_unknown: false,
            separator: '.',
            component_prefix: "#/components/".to_string(),
            aliases: HashMap::new(),
        }
    }

    /// Allow unknown keys on every object that does not say otherwise.
    pub fn allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }

    /// Set the reference path separator.
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Set the `$ref` prefix (e.g. `#/definitions/`).
    pub fn component_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.component_prefix = prefix.into();
        self
    }

    /// Register an extension type built on another tag.
    ///
    /// Aliases may chain (`email` → `trimmed` → `string`); chains are
    /// flattened once during ingestion.
    pub fn alias(mut self, name: impl Into<String>, base: impl Into<String>) -> Self {
        self.aliases.insert(name.into(), base.into());
        self
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::new()
    }
}
