// SPDX-License-Identifier: MIT OR Apache-2.0
//! Schema and serde checks for `AdapterConfig`.

use ak_config::{AdapterConfig, parse_toml, validate_config};
use schemars::schema_for;
use serde_json::Value;

fn config_schema() -> Value {
    serde_json::to_value(schema_for!(AdapterConfig)).unwrap()
}

#[test]
fn schema_lists_every_field() {
    let schema = config_schema();
    let props = schema["properties"].as_object().expect("properties object");
    for field in ["entity_id", "max_args_depth", "description_char_limit", "log_level"] {
        assert!(props.contains_key(field), "missing {field}");
    }
}

#[test]
fn default_config_roundtrips_through_toml() {
    let cfg = AdapterConfig::default();
    let text = toml::to_string(&cfg).unwrap();
    let back = parse_toml(&text).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn serialized_default_is_valid() {
    let json = serde_json::to_value(AdapterConfig::default()).unwrap();
    let back: AdapterConfig = serde_json::from_value(json).unwrap();
    assert!(validate_config(&back).is_ok());
}

#[test]
fn unbounded_description_limit_roundtrips_through_toml() {
    let cfg = AdapterConfig {
        description_char_limit: None,
        ..AdapterConfig::default()
    };
    let text = toml::to_string(&cfg).unwrap();
    assert!(text.contains("description_char_limit = 0"));
    assert_eq!(parse_toml(&text).unwrap(), cfg);
}
