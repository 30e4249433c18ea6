//! Integration tests for description conversion.

use schema_alternatives::{
    convert, convert_document, ConvertContext, ConvertError, ConvertOptions, Components, Schema,
};
use serde_json::{json, Value};

fn convert_json(description: Value) -> Value {
    convert_document(&description, &ConvertOptions::new()).unwrap()
}

fn variants(schema: &Value) -> &Vec<Value> {
    schema["oneOf"].as_array().expect("expected oneOf")
}

fn property_names(variant: &Value) -> Vec<&str> {
    variant["properties"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect()
}

/// Number of variants of `schema` the instance satisfies.
fn matching_variants(schema: &Value, instance: &Value) -> usize {
    variants(schema)
        .iter()
        .filter(|variant| {
            jsonschema::validator_for(variant)
                .unwrap()
                .is_valid(instance)
        })
        .count()
}

mod plain_objects {
    use super::*;

    #[test]
    fn object_without_rules_converts_directly() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "id": { "type": "string", "presence": "required" },
                "tags": { "type": "array", "items": { "type": "string" }, "max": 3 }
            }
        }));
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string" },
                    "tags": { "type": "array", "items": { "type": "string" }, "maxItems": 3 }
                },
                "required": ["id"],
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn metadata_passes_through() {
        let schema = convert_json(json!({
            "type": "string",
            "title": "Code",
            "examples": ["AB"]
        }));
        assert_eq!(schema["title"], "Code");
        assert_eq!(schema["example"], "AB");
    }

    #[test]
    fn convert_returns_descriptor() {
        let options = ConvertOptions::new();
        let components = Components::new();
        let ctx = ConvertContext::new(&options, &components);
        let schema = convert(&json!({ "type": "date" }), &ctx).unwrap();
        let Schema::String(string) = schema else {
            panic!("expected a string descriptor");
        };
        assert_eq!(string.format.as_deref(), Some("date-time"));
    }
}

mod exclusions {
    use super::*;

    #[test]
    fn single_nand_yields_one_variant_per_peer() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "id": { "type": "string" },
                "code": { "type": "string" },
                "text": { "type": "string" }
            },
            "dependencies": [{ "rel": "nand", "peers": ["code", "text"] }]
        }));
        let variants = variants(&schema);
        assert_eq!(variants.len(), 2);
        assert_eq!(property_names(&variants[0]), ["id", "text"]);
        assert_eq!(property_names(&variants[1]), ["id", "code"]);
    }

    #[test]
    fn chained_nands_share_a_combination() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "id": { "type": "string" },
                "code": { "type": "string" },
                "text": { "type": "string" }
            },
            "dependencies": [
                { "rel": "nand", "peers": ["code", "text"] },
                { "rel": "nand", "peers": ["code", "id"] }
            ]
        }));
        let variants = variants(&schema);
        assert_eq!(variants.len(), 2);
        assert_eq!(property_names(&variants[0]), ["text"]);
        assert_eq!(property_names(&variants[1]), ["code"]);
    }

    #[test]
    fn independent_nands_multiply() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "code": { "type": "string" },
                "text": { "type": "string" },
                "name": { "type": "string" },
                "id": { "type": "string" }
            },
            "dependencies": [
                { "rel": "nand", "peers": ["code", "text"] },
                { "rel": "nand", "peers": ["name", "id"] }
            ]
        }));
        let variants = variants(&schema);
        assert_eq!(variants.len(), 4);
        assert_eq!(property_names(&variants[0]), ["text", "id"]);
        assert_eq!(property_names(&variants[1]), ["text", "name"]);
        assert_eq!(property_names(&variants[2]), ["code", "id"]);
        assert_eq!(property_names(&variants[3]), ["code", "name"]);
    }

    #[test]
    fn wide_nand_yields_one_variant_per_peer() {
        let peers: Vec<String> = (0..12).map(|i| format!("f{}", i)).collect();
        let mut keys = serde_json::Map::new();
        keys.insert("id".to_string(), json!({ "type": "string" }));
        for peer in &peers {
            keys.insert(peer.clone(), json!({ "type": "string" }));
        }

        let schema = convert_json(json!({
            "type": "object",
            "keys": keys,
            "dependencies": [{ "rel": "nand", "peers": peers }]
        }));
        let variants = variants(&schema);
        assert_eq!(variants.len(), 12);
        assert_eq!(property_names(&variants[0]), ["id", "f11"]);
        assert_eq!(property_names(&variants[11]), ["id", "f0"]);
        assert_eq!(matching_variants(&schema, &json!({ "f3": "x" })), 1);
    }

    #[test]
    fn xor_requires_the_kept_peer() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "email": { "type": "string" },
                "phone": { "type": "string" }
            },
            "dependencies": [{ "rel": "xor", "peers": ["email", "phone"] }]
        }));
        let variants = variants(&schema);
        assert_eq!(variants[0]["required"], json!(["phone"]));
        assert_eq!(variants[1]["required"], json!(["email"]));

        assert_eq!(matching_variants(&schema, &json!({ "email": "a@b" })), 1);
        assert_eq!(matching_variants(&schema, &json!({})), 0);
        assert_eq!(
            matching_variants(&schema, &json!({ "email": "a@b", "phone": "1" })),
            0
        );
    }
}

mod conditions {
    use super::*;

    fn method_duration() -> Value {
        json!({
            "type": "object",
            "keys": {
                "method": { "type": "string", "allow": ["in", "out"], "presence": "required" },
                "duration": {
                    "type": "number",
                    "whens": [{
                        "ref": "method",
                        "is": { "type": "string", "allow": ["in"] },
                        "then": { "type": "any", "presence": "required" },
                        "otherwise": { "type": "any", "presence": "forbidden" }
                    }]
                }
            }
        })
    }

    #[test]
    fn existence_follows_sibling_value() {
        let schema = convert_json(method_duration());
        let variants = variants(&schema);
        assert_eq!(variants.len(), 2);

        assert_eq!(variants[0]["properties"]["method"]["enum"], json!(["in"]));
        let required = variants[0]["required"].as_array().unwrap();
        assert!(required.contains(&json!("duration")));
        assert!(required.contains(&json!("method")));

        assert_eq!(variants[1]["properties"]["method"]["enum"], json!(["out"]));
        assert!(variants[1]["properties"].get("duration").is_none());
    }

    #[test]
    fn variants_are_exclusive() {
        let schema = convert_json(method_duration());
        let accepted = [
            json!({ "method": "in", "duration": 5 }),
            json!({ "method": "out" }),
        ];
        for instance in &accepted {
            assert_eq!(matching_variants(&schema, instance), 1, "{}", instance);
        }
        let rejected = [
            json!({ "method": "in" }),
            json!({ "method": "out", "duration": 5 }),
            json!({ "duration": 5 }),
        ];
        for instance in &rejected {
            assert_eq!(matching_variants(&schema, instance), 0, "{}", instance);
        }
    }

    #[test]
    fn unrestricted_reference_gets_negative_enum() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "method": { "type": "string" },
                "duration": {
                    "type": "number",
                    "whens": [{
                        "ref": "method",
                        "is": { "type": "string", "allow": ["in"] },
                        "otherwise": { "type": "any", "presence": "forbidden" }
                    }]
                }
            }
        }));
        let variants = variants(&schema);
        assert_eq!(variants.len(), 2);
        assert_eq!(
            variants[1]["properties"]["method"],
            json!({ "type": "string", "not": { "enum": ["in"] } })
        );
        assert_eq!(matching_variants(&schema, &json!({ "method": "x" })), 1);
        assert_eq!(matching_variants(&schema, &json!({})), 1);
    }

    #[test]
    fn exists_test_splits_on_presence() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "coupon": { "type": "string" },
                "discount": {
                    "type": "number",
                    "whens": [{
                        "ref": "coupon",
                        "then": { "type": "any", "presence": "required" },
                        "otherwise": { "type": "any", "presence": "forbidden" }
                    }]
                }
            }
        }));
        let variants = variants(&schema);
        assert_eq!(variants.len(), 2);
        assert!(property_names(&variants[1]).is_empty());
        assert_eq!(
            matching_variants(&schema, &json!({ "coupon": "X", "discount": 3 })),
            1
        );
        assert_eq!(matching_variants(&schema, &json!({})), 1);
        assert_eq!(matching_variants(&schema, &json!({ "discount": 3 })), 0);
    }

    #[test]
    fn forbidden_test_swaps_outcomes() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "coupon": { "type": "string" },
                "reason": {
                    "type": "string",
                    "whens": [{
                        "ref": "coupon",
                        "is": "forbidden",
                        "then": { "type": "any", "presence": "required" }
                    }]
                }
            }
        }));
        assert_eq!(matching_variants(&schema, &json!({ "reason": "none" })), 1);
        assert_eq!(matching_variants(&schema, &json!({})), 0);
        assert_eq!(matching_variants(&schema, &json!({ "coupon": "X" })), 1);
    }

    #[test]
    fn then_schema_merges_into_field() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "kind": { "type": "string", "allow": ["short", "long"], "presence": "required" },
                "label": {
                    "type": "string",
                    "whens": [{
                        "ref": "kind",
                        "is": { "type": "string", "allow": ["short"] },
                        "then": { "type": "string", "max": 8 }
                    }]
                }
            }
        }));
        let variants = variants(&schema);
        assert_eq!(variants[0]["properties"]["label"]["maxLength"], 8);
        assert!(variants[1]["properties"]["label"].get("maxLength").is_none());
    }

    #[test]
    fn contradictory_axes_drop_empty_variants() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "method": { "type": "string", "allow": ["in", "out"], "presence": "required" },
                "duration": {
                    "type": "number",
                    "whens": [{
                        "ref": "method",
                        "is": { "type": "string", "allow": ["in"] },
                        "then": { "type": "any", "presence": "required" }
                    }]
                },
                "target": {
                    "type": "string",
                    "whens": [{
                        "ref": "method",
                        "is": { "type": "string", "allow": ["out"] },
                        "then": { "type": "any", "presence": "required" }
                    }]
                }
            }
        }));
        for variant in variants(&schema) {
            assert!(variant["properties"]["method"]["enum"].as_array().unwrap().len() == 1);
        }
        assert_eq!(
            matching_variants(&schema, &json!({ "method": "in", "duration": 1 })),
            1
        );
        assert_eq!(
            matching_variants(&schema, &json!({ "method": "out", "target": "x" })),
            1
        );
    }

    #[test]
    fn missing_reference_fails() {
        let result = convert_document(
            &json!({
                "type": "object",
                "keys": {
                    "duration": {
                        "type": "number",
                        "whens": [{ "ref": "method" }]
                    }
                }
            }),
            &ConvertOptions::new(),
        );
        assert!(matches!(
            result,
            Err(ConvertError::MissingReferenceTarget { path, reference })
                if path == "/keys/duration/whens/0" && reference == "method"
        ));
    }
}

mod scopes {
    use super::*;

    #[test]
    fn outer_reference_propagates_to_parent() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "kind": { "type": "string", "allow": ["a", "b"], "presence": "required" },
                "payload": {
                    "type": "object",
                    "keys": {
                        "extra": {
                            "type": "string",
                            "whens": [{
                                "ref": "...kind",
                                "is": { "type": "string", "allow": ["a"] },
                                "then": { "type": "any", "presence": "required" },
                                "otherwise": { "type": "any", "presence": "forbidden" }
                            }]
                        }
                    }
                }
            }
        }));
        let variants = variants(&schema);
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0]["properties"]["kind"]["enum"], json!(["a"]));
        assert_eq!(
            variants[0]["properties"]["payload"]["required"],
            json!(["extra"])
        );
        assert_eq!(variants[1]["properties"]["kind"]["enum"], json!(["b"]));
        assert_eq!(variants[1]["properties"]["payload"]["properties"], json!({}));
    }

    #[test]
    fn own_children_reference() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "payload": {
                    "type": "object",
                    "keys": {
                        "kind": { "type": "string", "allow": ["x", "y"] }
                    },
                    "whens": [{
                        "ref": ".kind",
                        "is": { "type": "string", "allow": ["x"] },
                        "then": {
                            "type": "object",
                            "keys": { "note": { "type": "string", "presence": "required" } }
                        }
                    }]
                }
            }
        }));
        let variants = variants(&schema);
        assert_eq!(variants.len(), 2);
        let positive = &variants[0]["properties"]["payload"];
        assert_eq!(positive["properties"]["kind"]["enum"], json!(["x"]));
        assert!(positive["required"].as_array().unwrap().contains(&json!("note")));
        let negative = &variants[1]["properties"]["payload"];
        assert_eq!(negative["properties"]["kind"]["enum"], json!(["y"]));
    }

    #[test]
    fn array_items_resolve_locally() {
        let schema = convert_json(json!({
            "type": "object",
            "keys": {
                "lines": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "keys": {
                            "unit": { "type": "string", "allow": ["kg", "pc"], "presence": "required" },
                            "weight": {
                                "type": "number",
                                "whens": [{
                                    "ref": "unit",
                                    "is": { "type": "string", "allow": ["kg"] },
                                    "then": { "type": "any", "presence": "required" },
                                    "otherwise": { "type": "any", "presence": "forbidden" }
                                }]
                            }
                        }
                    }
                }
            }
        }));
        assert!(schema.get("oneOf").is_none());
        let items = &schema["properties"]["lines"]["items"];
        assert_eq!(items["oneOf"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn reference_through_component() {
        let document = convert_json(json!({
            "components": {
                "schemas": {
                    "Address": {
                        "type": "object",
                        "keys": {
                            "country": { "type": "string", "allow": ["NL", "BE"], "presence": "required" }
                        }
                    }
                }
            },
            "schema": {
                "type": "object",
                "keys": {
                    "address": { "type": "link", "ref": "Address", "presence": "required" },
                    "vat": {
                        "type": "string",
                        "whens": [{
                            "ref": "address.country",
                            "is": { "type": "string", "allow": ["NL"] },
                            "then": { "type": "any", "presence": "required" },
                            "otherwise": { "type": "any", "presence": "forbidden" }
                        }]
                    }
                }
            }
        }));
        let schema = &document["schema"];
        let variants = variants(schema);
        assert_eq!(variants.len(), 2);
        assert_eq!(
            variants[0]["properties"]["address"]["properties"]["country"]["enum"],
            json!(["NL"])
        );
        assert!(variants[1]["properties"].get("vat").is_none());
        assert!(document["components"]["schemas"]["Address"].is_object());
    }
}

mod errors {
    use super::*;

    #[test]
    fn unknown_kind_is_reported() {
        let result = convert_document(&json!({ "type": "money" }), &ConvertOptions::new());
        assert!(matches!(
            result,
            Err(ConvertError::UnknownSchemaKind { kind, .. }) if kind == "money"
        ));
    }

    #[test]
    fn alias_resolves_extension() {
        let options = ConvertOptions::new().alias("money", "number");
        let schema = convert_document(&json!({ "type": "money", "min": 0 }), &options).unwrap();
        assert_eq!(schema, json!({ "type": "number", "minimum": 0 }));
    }

    #[test]
    fn exit_code_is_schema_error() {
        let error = convert_document(&json!({ "type": "money" }), &ConvertOptions::new())
            .unwrap_err();
        assert_eq!(error.exit_code(), 2);
    }
}
