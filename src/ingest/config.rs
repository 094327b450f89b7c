// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::ingest::types::SourceSpec;

/// Load an ordered source list from a file. Supports TOML or JSON formats:
/// TOML `[[sources]] name = "..." url = "..."`, JSON `[{"name": "...", "url": "..."}]`.
pub fn load_sources_from(path: &Path) -> Result<Vec<SourceSpec>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading source list from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<SourceSpec>> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("[[sources]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported source list format"))
}

fn parse_toml(s: &str) -> Result<Vec<SourceSpec>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<SourceSpec>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(clean_sources(v.sources))
}

fn parse_json(s: &str) -> Result<Vec<SourceSpec>> {
    let v: Vec<SourceSpec> = serde_json::from_str(s)?;
    Ok(clean_sources(v))
}

/// Trim, drop entries without a URL, and drop repeated URLs. Priority order is kept.
pub fn clean_sources(items: Vec<SourceSpec>) -> Vec<SourceSpec> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let url = it.url.trim().to_string();
        if url.is_empty() || !seen.insert(url.clone()) {
            continue;
        }
        let name = match it.name.trim() {
            "" => url.clone(),
            n => n.to_string(),
        };
        out.push(SourceSpec { name, url });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_trim_and_formats_work() {
        let toml = r#"
[[sources]]
name = " kqdt "
url = "https://a.example/mega"

[[sources]]
name = ""
url = "https://b.example/mega"

[[sources]]
name = "dup"
url = " https://a.example/mega "
"#;
        let out = parse_sources(toml, "toml").unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "kqdt");
        assert_eq!(out[1].name, "https://b.example/mega");

        let json = r#"[{"name":"x","url":""},{"name":"y","url":"https://c.example"}]"#;
        let out = parse_sources(json, "json").unwrap();
        assert_eq!(
            out,
            vec![SourceSpec {
                name: "y".into(),
                url: "https://c.example".into()
            }]
        );
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_sources("sources = 3", "").is_err());
    }
}
