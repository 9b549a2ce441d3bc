//! Flat key/value parameters: deployment settings and secret-reference names.

use std::collections::BTreeMap;

use serde_yaml_ng::Value;

use crate::error::{ConfigError, Result};

/// Read-only access to deployment parameters.
pub trait ParamStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Accepts `true/false`, `yes/no`, `on/off` and `1/0`, case-insensitively.
    /// Anything else reads as absent.
    fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?;
        let parsed = parse_bool(&value);
        if parsed.is_none() {
            tracing::warn!(key, value = %value, "ignoring non-boolean parameter");
        }
        parsed
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// In-memory parameter store. Later writes win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticParams {
    values: BTreeMap<String, String>,
}

impl StaticParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Apply a `key=value` assignment (command-line override).
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<()> {
        let Some((key, value)) = assignment.split_once('=') else {
            return Err(ConfigError::InvalidParam {
                key: assignment.to_string(),
                value: String::new(),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::InvalidParam {
                key: String::new(),
                value: value.to_string(),
            });
        }
        self.set(key, value);
        Ok(())
    }

    /// Load parameters from a YAML mapping.
    ///
    /// A top-level `config:` mapping (stack settings layout) is descended into.
    /// Scalars are stringified; sequences and mappings are stored as JSON so
    /// that structured parameters such as `vms` can be written inline.
    /// Namespaced keys (`stack:vmName`) are also reachable by their bare name,
    /// except for the `gcp:` namespace which is always addressed in full.
    pub fn from_yaml(content: &str, source_name: &str) -> Result<Self> {
        let mut params = Self::new();
        if content.trim().is_empty() {
            return Ok(params);
        }
        let root: Value =
            serde_yaml_ng::from_str(content).map_err(|e| ConfigError::parse(source_name, e))?;
        let mapping = match root {
            Value::Mapping(mut m) => match m.remove("config") {
                Some(Value::Mapping(inner)) => inner,
                Some(other) => {
                    m.insert(Value::String("config".into()), other);
                    m
                }
                None => m,
            },
            Value::Null => return Ok(params),
            _ => {
                return Err(ConfigError::parse(source_name, "expected a mapping of parameters"));
            }
        };

        let mut bare = Vec::new();
        for (key, value) in mapping {
            let Value::String(key) = key else {
                return Err(ConfigError::parse(source_name, "parameter keys must be strings"));
            };
            let Some(value) = stringify(&value, source_name)? else {
                continue;
            };
            if let Some((ns, name)) = key.split_once(':')
                && ns != "gcp"
                && !name.is_empty()
            {
                bare.push((name.to_string(), value.clone()));
            }
            params.values.insert(key, value);
        }
        for (name, value) in bare {
            params.values.entry(name).or_insert(value);
        }
        Ok(params)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn stringify(value: &Value, source_name: &str) -> Result<Option<String>> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(_) | Value::Mapping(_) => {
            serde_json::to_string(value).map_err(|e| ConfigError::parse(source_name, e))?
        }
        Value::Tagged(tagged) => return stringify(&tagged.value, source_name),
    };
    Ok(Some(text))
}

impl ParamStore for StaticParams {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_bool_variants() {
        let params = StaticParams::new()
            .with("a", "true")
            .with("b", "No")
            .with("c", "1")
            .with("d", "maybe");
        assert_eq!(params.get_bool("a"), Some(true));
        assert_eq!(params.get_bool("b"), Some(false));
        assert_eq!(params.get_bool("c"), Some(true));
        assert_eq!(params.get_bool("d"), None);
        assert_eq!(params.get_bool("missing"), None);
    }

    #[test]
    fn from_yaml_stringifies_scalars() {
        let params = StaticParams::from_yaml(
            "vmName: dev-1\ndiskSizeGb: 250\nenableMinimalMode: true\nempty: null\n",
            "params.yaml",
        )
        .unwrap();
        assert_eq!(params.get("vmName").as_deref(), Some("dev-1"));
        assert_eq!(params.get("diskSizeGb").as_deref(), Some("250"));
        assert_eq!(params.get_bool("enableMinimalMode"), Some(true));
        assert_eq!(params.get("empty"), None);
    }

    #[test]
    fn from_yaml_stack_layout() {
        let yaml = r#"
config:
  gcp:project: my-proj
  posthog-dev:vmName: dev-2
  posthog-dev:additionalRepos:
    - url: https://github.com/posthog/posthog-js.git
"#;
        let params = StaticParams::from_yaml(yaml, "Pulumi.dev.yaml").unwrap();
        assert_eq!(params.get("gcp:project").as_deref(), Some("my-proj"));
        assert_eq!(params.get("project"), None);
        assert_eq!(params.get("vmName").as_deref(), Some("dev-2"));
        assert_eq!(
            params.get("additionalRepos").as_deref(),
            Some(r#"[{"url":"https://github.com/posthog/posthog-js.git"}]"#)
        );
    }

    #[test]
    fn explicit_bare_key_beats_namespaced() {
        let params =
            StaticParams::from_yaml("stack:vmName: namespaced\nvmName: bare\n", "p.yaml").unwrap();
        assert_eq!(params.get("vmName").as_deref(), Some("bare"));
    }

    #[test]
    fn from_yaml_rejects_non_mapping() {
        let err = StaticParams::from_yaml("- a\n- b\n", "p.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    }

    #[test]
    fn assignments_override() {
        let mut params = StaticParams::new().with("vmName", "a");
        params.apply_assignment("vmName=b").unwrap();
        params.apply_assignment("osImage=proj/img=x").unwrap();
        assert_eq!(params.get("vmName").as_deref(), Some("b"));
        assert_eq!(params.get("osImage").as_deref(), Some("proj/img=x"));
        assert!(params.apply_assignment("novalue").is_err());
        assert!(params.apply_assignment("=x").is_err());
    }
}
