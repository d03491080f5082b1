//! Layer merge
//!
//! - Objects: deep-merge by key
//! - Arrays: replace (last wins)
//! - Scalars: override (last wins)

use serde_json::Value;

/// Deep merge two JSON values; `overlay` takes precedence.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge layers in order; the last has the highest precedence.
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_key_preserved() {
        let base = json!({"output": {"config_file": "config.yaml", "plugins_file": "plugins.yaml"}});
        let overlay = json!({"output": {"config_file": "prow.yaml"}});
        let result = deep_merge(base, overlay);
        assert_eq!(result["output"]["config_file"], "prow.yaml");
        assert_eq!(result["output"]["plugins_file"], "plugins.yaml");
    }

    #[test]
    fn test_array_replaced() {
        let result = deep_merge(json!({"repos": ["a", "b"]}), json!({"repos": ["c"]}));
        assert_eq!(result["repos"], json!(["c"]));
    }

    #[test]
    fn test_null_overrides() {
        let result = deep_merge(
            json!({"gitops": {"dev_env_repo": "acme/env"}}),
            json!({"gitops": {"dev_env_repo": null}}),
        );
        assert!(result["gitops"]["dev_env_repo"].is_null());
    }

    #[test]
    fn test_layer_precedence() {
        let result = merge_layers(vec![
            json!({"namespace": "jx", "gitops": {"enabled": false}}),
            json!({"namespace": "ci"}),
            json!({"gitops": {"enabled": true}}),
            json!({"namespace": "cli"}),
        ]);
        assert_eq!(result["namespace"], "cli");
        assert_eq!(result["gitops"]["enabled"], true);
    }
}
