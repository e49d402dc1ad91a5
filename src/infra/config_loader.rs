// ============================================================
// Layer 6 — Configuration Loader
// ============================================================
// Builds the InferenceConfig from two layers:
//
//   1. a JSON file (or the built-in defaults when none is given)
//   2. dotted overrides from the command line, applied in order:
//
//        model.infer_ds.batch_size=32
//        model.representations_path=null
//        trainer.accelerator=cpu
//
// Override values are read as JSON when they parse as JSON and
// as plain strings otherwise, so `cpu` and `"cpu"` are the same.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::{fs, path::Path};

use crate::application::config::InferenceConfig;

/// Load a config file (if any), apply overrides, and validate.
pub fn load(path: Option<&Path>, overrides: &[String]) -> Result<InferenceConfig> {
    let mut tree = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Cannot read config '{}'", path.display()))?;
            serde_json::from_str::<Value>(&text)
                .with_context(|| format!("Config '{}' is not valid JSON", path.display()))?
        }
        None => serde_json::to_value(InferenceConfig::default())?,
    };

    for raw in overrides {
        apply_override(&mut tree, raw)?;
    }

    let config: InferenceConfig = serde_json::from_value(tree)
        .context("Configuration does not match the expected schema")?;
    config.validate()?;
    Ok(config)
}

/// Apply a single `dotted.key=value` override to the tree.
pub fn apply_override(tree: &mut Value, raw: &str) -> Result<()> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Override '{}' must look like key.path=value", raw);
    };
    let key = key.trim();
    if key.is_empty() || key.split('.').any(str::is_empty) {
        bail!("Override '{}' has an empty key segment", raw);
    }

    let value = parse_value(value.trim());
    let segments: Vec<&str> = key.split('.').collect();
    let (last, parents) = segments
        .split_last()
        .context("override key is empty")?;

    let mut node = tree;
    for segment in parents {
        let object = as_object(node, key)?;
        node = object
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    as_object(node, key)?.insert(last.to_string(), value);

    tracing::debug!("Applied override {}", raw);
    Ok(())
}

fn as_object<'a>(node: &'a mut Value, key: &str) -> Result<&'a mut Map<String, Value>> {
    match node {
        Value::Object(map) => Ok(map),
        other => bail!("Cannot override '{}': a parent is {} not an object", key, kind(other)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_)  => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::Accelerator;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_override_sets_nested_number() {
        let mut tree = json!({"model": {"infer_ds": {"batch_size": 8}}});
        apply_override(&mut tree, "model.infer_ds.batch_size=32").unwrap();
        assert_eq!(tree["model"]["infer_ds"]["batch_size"], json!(32));
    }

    #[test]
    fn test_override_bare_word_is_a_string() {
        let mut tree = json!({});
        apply_override(&mut tree, "trainer.accelerator=cpu").unwrap();
        assert_eq!(tree["trainer"]["accelerator"], json!("cpu"));
    }

    #[test]
    fn test_override_null_clears_value() {
        let mut tree = json!({"model": {"representations_path": "out"}});
        apply_override(&mut tree, "model.representations_path=null").unwrap();
        assert_eq!(tree["model"]["representations_path"], Value::Null);
    }

    #[test]
    fn test_override_through_scalar_fails() {
        let mut tree = json!({"trainer": 3});
        assert!(apply_override(&mut tree, "trainer.gpus=2").is_err());
    }

    #[test]
    fn test_malformed_overrides_fail() {
        let mut tree = json!({});
        assert!(apply_override(&mut tree, "no_equals_sign").is_err());
        assert!(apply_override(&mut tree, "=3").is_err());
        assert!(apply_override(&mut tree, "model..x=3").is_err());
    }

    #[test]
    fn test_defaults_with_overrides() {
        let overrides = vec![
            "trainer.accelerator=cpu".to_string(),
            "model.infer_ds.shuffle=true".to_string(),
        ];
        let cfg = load(None, &overrides).unwrap();
        assert_eq!(cfg.trainer.accelerator, Accelerator::Cpu);
        assert!(cfg.model.infer_ds.shuffle);
    }

    #[test]
    fn test_file_then_overrides() {
        let dir = std::env::temp_dir().join("protbert_config_file");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("infer.json");
        fs::write(
            &path,
            r#"{"trainer":{"gpus":2},"model":{"nemo_path":"ckpt","infer_ds":{"data_file":"d.jsonl","batch_size":4}}}"#,
        )
        .unwrap();

        let cfg = load(Some(&path), &["model.infer_ds.batch_size=16".to_string()]).unwrap();
        assert_eq!(cfg.trainer.gpus, 2);
        assert_eq!(cfg.model.nemo_path, PathBuf::from("ckpt"));
        assert_eq!(cfg.model.infer_ds.batch_size, 16);
    }

    #[test]
    fn test_invalid_result_is_rejected() {
        assert!(load(None, &["model.infer_ds.batch_size=0".to_string()]).is_err());
    }
}
