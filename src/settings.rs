use std::{collections::BTreeMap, fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

/// Top-level settings file.
///
/// `email` is sent as `mailto=` on every API request per OpenAlex's polite
/// pool policy. Queries are keyed by an arbitrary name used only in
/// diagnostics; iteration order is the key order (BTreeMap), so runs are
/// deterministic regardless of how the YAML was written.
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub email: String,
    #[serde(default)]
    pub impact_threshold: f64,
    pub queries: BTreeMap<String, QueryDef>,
}

/// One configured query.
///
/// `kind` is kept as a plain string rather than an enum so that an unknown
/// `type:` value survives parsing and can be skipped at dispatch time with a
/// diagnostic, instead of failing the whole settings file.
#[derive(Debug, Deserialize)]
pub struct QueryDef {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub feed_name: String,
    pub search: Option<String>,
    pub authors: Option<Vec<AuthorRef>>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorRef {
    pub id: String,
    pub name: String,
}

fn default_kind() -> String {
    "keyword".to_string()
}

pub fn load(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    serde_yaml::from_str(&raw)
        .with_context(|| format!("malformed settings file {}", path.display()))
}
