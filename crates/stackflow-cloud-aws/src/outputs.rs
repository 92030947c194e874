//! Bootstrap output schema
//!
//! Maps every output the bootstrap document declares onto an [`AwsMeta`]
//! field. Decoding is exhaustive: a missing, unknown or non-string output is
//! a [`StackError::Decode`].

use serde_json::Value;
use stackflow_core::{AwsMeta, StackError};
use std::collections::BTreeMap;

/// Output keys the bootstrap document declares
pub const BOOTSTRAP_OUTPUTS: &[&str] = &[
    "acl",
    "ami",
    "cidr_block",
    "igw",
    "key_pair",
    "region",
    "rtb",
    "sg",
    "subnet",
    "vpc",
];

/// Metadata field an output key maps to
fn field<'a>(meta: &'a mut AwsMeta, output: &str) -> Option<&'a mut String> {
    match output {
        "acl" => Some(&mut meta.acl),
        "ami" => Some(&mut meta.ami),
        "cidr_block" => Some(&mut meta.cidr_block),
        "igw" => Some(&mut meta.igw),
        "key_pair" => Some(&mut meta.key_pair),
        "region" => Some(&mut meta.region),
        "rtb" => Some(&mut meta.rtb),
        "sg" => Some(&mut meta.sg),
        "subnet" => Some(&mut meta.subnet),
        "vpc" => Some(&mut meta.vpc),
        _ => None,
    }
}

/// Decode apply outputs into `meta`.
///
/// `meta` is only modified when every output decodes.
pub fn decode(
    identifier: &str,
    outputs: &BTreeMap<String, Value>,
    meta: &mut AwsMeta,
) -> Result<(), StackError> {
    let decode_err = |reason: String| StackError::Decode {
        identifier: identifier.to_string(),
        reason,
    };

    let unknown: Vec<&str> = outputs
        .keys()
        .map(String::as_str)
        .filter(|key| !BOOTSTRAP_OUTPUTS.contains(key))
        .collect();
    if !unknown.is_empty() {
        return Err(decode_err(format!("unknown outputs: {}", unknown.join(", "))));
    }

    let mut decoded = meta.clone();
    for name in BOOTSTRAP_OUTPUTS {
        let value = outputs
            .get(*name)
            .ok_or_else(|| decode_err(format!("missing output '{}'", name)))?;

        let Value::String(s) = value else {
            return Err(decode_err(format!(
                "output '{}' must be a string, got {}",
                name, value
            )));
        };

        let slot = field(&mut decoded, name)
            .ok_or_else(|| decode_err(format!("output '{}' has no metadata field", name)))?;
        *slot = s.clone();
    }

    *meta = decoded;
    Ok(())
}
