//! Stack template builder
//!
//! Parses an infrastructure document (JSON flavoured HCL) into a mutable
//! tree, lets the platform bind variables and patch resources on typed
//! nodes, and serializes the finished document for the executor.
//!
//! Substitution never touches raw text: values are written into the
//! `variable` block as defaults, and `${var.*}` interpolations are left for
//! the executor to evaluate.

use crate::error::{Result, StackError};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const VARIABLE_BLOCK: &str = "variable";
const RESOURCE_BLOCK: &str = "resource";
const PROVIDER_BLOCK: &str = "provider";

/// How strictly [`Template::json_output`] treats unbound variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every declared variable must be bound.
    Apply,
    /// Declared variables starting with the given prefix may stay unbound.
    Plan { deferred_prefix: String },
}

/// A parsed infrastructure document bound to a content id
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    content_id: String,
    root: Map<String, Value>,
}

impl Template {
    /// Parse raw content into a template.
    pub fn parse(raw: &str, content_id: impl Into<String>) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(StackError::Template("template content is empty".into()));
        }

        let value: Value = serde_json::from_str(raw)
            .map_err(|e| StackError::Template(format!("unable to parse template: {}", e)))?;

        Self::from_value(value, content_id)
    }

    /// Wrap an already parsed document.
    pub fn from_value(value: Value, content_id: impl Into<String>) -> Result<Self> {
        let Value::Object(root) = value else {
            return Err(StackError::Template(
                "template root must be an object".into(),
            ));
        };

        for block in [VARIABLE_BLOCK, RESOURCE_BLOCK, PROVIDER_BLOCK] {
            if let Some(node) = root.get(block)
                && !node.is_object()
            {
                return Err(StackError::Template(format!(
                    "\"{}\" block must be an object",
                    block
                )));
            }
        }

        Ok(Self {
            content_id: content_id.into(),
            root,
        })
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Declared variables and their default, if bound.
    pub fn declared_variables(&self) -> BTreeMap<String, Option<&Value>> {
        self.root
            .get(VARIABLE_BLOCK)
            .and_then(Value::as_object)
            .map(|vars| {
                vars.iter()
                    .map(|(name, decl)| (name.clone(), decl.get("default")))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Declared variables without a default.
    pub fn unbound_variables(&self) -> Vec<String> {
        self.declared_variables()
            .into_iter()
            .filter(|(_, default)| default.is_none())
            .map(|(name, _)| name)
            .collect()
    }

    /// Variable names referenced from `${...}` interpolations anywhere in the document.
    pub fn referenced_variables(&self) -> Result<BTreeSet<String>> {
        let interpolation = Regex::new(r"\$\{([^}]*)\}")
            .map_err(|e| StackError::Template(format!("regex compile error: {}", e)))?;
        let reference = Regex::new(r"\bvar\.([A-Za-z_][A-Za-z0-9_-]*)")
            .map_err(|e| StackError::Template(format!("regex compile error: {}", e)))?;

        let mut names = BTreeSet::new();
        let mut strings = Vec::new();
        for value in self.root.values() {
            collect_strings(value, &mut strings);
        }

        for s in strings {
            for cap in interpolation.captures_iter(s) {
                for var in reference.captures_iter(&cap[1]) {
                    names.insert(var[1].to_string());
                }
            }
        }

        Ok(names)
    }

    /// Unbound declarations plus references to variables never declared.
    pub fn unresolved_variables(&self) -> Result<Vec<String>> {
        let declared = self.declared_variables();
        let mut unresolved: BTreeSet<String> = self.unbound_variables().into_iter().collect();

        unresolved.extend(
            self.referenced_variables()?
                .into_iter()
                .filter(|name| !declared.contains_key(name)),
        );

        Ok(unresolved.into_iter().collect())
    }

    /// Bind variables, declaring them when missing.
    pub fn inject_variables<K, V>(&mut self, variables: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let block = object_entry(&mut self.root, VARIABLE_BLOCK);

        for (name, value) in variables {
            let name = name.into();
            let decl = block
                .entry(name.clone())
                .or_insert_with(|| Value::Object(Map::new()));

            if !decl.is_object() {
                *decl = Value::Object(Map::new());
            }
            if let Value::Object(decl) = decl {
                decl.insert("default".to_string(), value.into());
            }
            debug!(content_id = %self.content_id, variable = %name, "Bound template variable");
        }
    }

    /// Bind every unresolved variable starting with `prefix` to a
    /// deterministic placeholder and return the names it filled.
    ///
    /// Variables outside the prefix are left untouched.
    pub fn fill_variables(&mut self, prefix: &str) -> Result<Vec<String>> {
        let filled: Vec<String> = self
            .unresolved_variables()?
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .collect();

        self.inject_variables(
            filled
                .iter()
                .map(|name| (name.clone(), placeholder_value(name))),
        );

        Ok(filled)
    }

    /// Set a field inside `provider.<name>`.
    pub fn set_provider_field(&mut self, provider: &str, key: &str, value: impl Into<Value>) {
        let providers = object_entry(&mut self.root, PROVIDER_BLOCK);
        let block = providers
            .entry(provider.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        if !block.is_object() {
            *block = Value::Object(Map::new());
        }
        if let Value::Object(block) = block {
            block.insert(key.to_string(), value.into());
        }
    }

    pub fn provider_field(&self, provider: &str, key: &str) -> Option<&Value> {
        self.root.get(PROVIDER_BLOCK)?.get(provider)?.get(key)
    }

    /// Names of all resources of the given type, in key order.
    pub fn resource_names(&self, resource_type: &str) -> Vec<String> {
        self.root
            .get(RESOURCE_BLOCK)
            .and_then(|r| r.get(resource_type))
            .and_then(Value::as_object)
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Mutable bodies of every resource of the given type.
    pub fn resources_mut(
        &mut self,
        resource_type: &str,
    ) -> impl Iterator<Item = (&String, &mut Map<String, Value>)> {
        self.root
            .get_mut(RESOURCE_BLOCK)
            .and_then(|r| r.get_mut(resource_type))
            .and_then(Value::as_object_mut)
            .into_iter()
            .flat_map(|r| r.iter_mut())
            .filter_map(|(name, body)| body.as_object_mut().map(|body| (name, body)))
    }

    /// Serialize the document.
    ///
    /// Fails when declared variables remain unbound, except those the
    /// resolution mode allows to be deferred.
    pub fn json_output(&self, resolution: &Resolution) -> Result<String> {
        let blocking: Vec<String> = self
            .unbound_variables()
            .into_iter()
            .filter(|name| match resolution {
                Resolution::Apply => true,
                Resolution::Plan { deferred_prefix } => !name.starts_with(deferred_prefix.as_str()),
            })
            .collect();

        if !blocking.is_empty() {
            return Err(StackError::Template(format!(
                "template {} has unresolved variables: {}",
                self.content_id,
                blocking.join(", ")
            )));
        }

        Ok(serde_json::to_string(&self.root)?)
    }
}

/// Deterministic value used for variables filled in during planning.
pub fn placeholder_value(name: &str) -> String {
    format!("placeholder-{}", name)
}

fn object_entry<'a>(root: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = root
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));

    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(map) => map,
        _ => unreachable!("entry was just replaced with an object"),
    }
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}
