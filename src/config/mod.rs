// src/config/mod.rs
//! Run configuration, passed explicitly into the pipeline (no globals).
//!
//! Lookup order:
//! 1) `$DRAW_RANKER_CONFIG` (must exist when set)
//! 2) `config/pipeline.toml`
//! 3) `config/pipeline.json`
//! 4) built-in defaults (Mega 6/45 + Power 6/55 sources)

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyze::SignalWeights;
use crate::draw::{DRAW_SIZE, MAX_DOMAIN};
use crate::ingest::config::{clean_sources, load_sources_from};
use crate::ingest::fetch::{RetryPolicy, DEFAULT_USER_AGENT};
use crate::ingest::types::SourceSpec;
use crate::ingest::AcquisitionMode;

pub const ENV_CONFIG_PATH: &str = "DRAW_RANKER_CONFIG";

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_limit() -> usize {
    100
}
fn default_window() -> usize {
    50
}
fn default_top_k() -> usize {
    DRAW_SIZE
}
fn default_min_history() -> usize {
    50
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Also the snapshot file stem, e.g. `mega_6_45` → `mega_6_45.csv`.
    pub name: String,
    pub domain_max: u8,
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
    /// Extra sources appended from a TOML/JSON list file.
    #[serde(default)]
    pub sources_path: Option<PathBuf>,
    /// Probability export of an external classifier for this game.
    #[serde(default)]
    pub classifier_probs: Option<PathBuf>,
}

impl GameConfig {
    pub fn mega_6_45() -> Self {
        Self {
            name: "mega_6_45".into(),
            domain_max: 45,
            sources: vec![
                source("ketquadientoan", "https://www.ketquadientoan.com/tat-ca-ky-xo-so-mega-6-45.html"),
                source("minhngoc", "https://www.minhngoc.net.vn/ket-qua-xo-so/dien-toan-vietlott/mega-6x45.html"),
                source("lotto-8", "https://www.lotto-8.com/Vietnam/listltoVM45.asp"),
            ],
            sources_path: None,
            classifier_probs: None,
        }
    }

    pub fn power_6_55() -> Self {
        Self {
            name: "power_6_55".into(),
            domain_max: 55,
            sources: vec![
                source("ketquadientoan", "https://www.ketquadientoan.com/tat-ca-ky-xo-so-power-655.html"),
                source("minhngoc", "https://www.minhngoc.net.vn/ket-qua-xo-so/dien-toan-vietlott/power-6x55.html"),
                source("lotto-8", "https://www.lotto-8.com/Vietnam/listltoVM55.asp"),
            ],
            sources_path: None,
            classifier_probs: None,
        }
    }

    pub fn snapshot_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{}.csv", self.name))
    }
}

fn source(name: &str, url: &str) -> SourceSpec {
    SourceSpec {
        name: name.into(),
        url: url.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Row limit of each game's dataset.
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Below this many rows the classifier is not consulted.
    #[serde(default = "default_min_history")]
    pub min_history: usize,
    #[serde(default)]
    pub mode: AcquisitionMode,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub weights: SignalWeights,
    #[serde(default = "GameConfig::mega_6_45")]
    pub primary: GameConfig,
    #[serde(default = "GameConfig::power_6_55")]
    pub secondary: GameConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            limit: default_limit(),
            window: default_window(),
            top_k: default_top_k(),
            min_history: default_min_history(),
            mode: AcquisitionMode::default(),
            user_agent: default_user_agent(),
            retry: RetryPolicy::default(),
            weights: SignalWeights::default(),
            primary: GameConfig::mega_6_45(),
            secondary: GameConfig::power_6_55(),
        }
    }
}

impl PipelineConfig {
    /// Load from an explicit path (TOML or JSON by extension), resolve source files, validate.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mut cfg: PipelineConfig = match ext.as_str() {
            "json" => serde_json::from_str(&content).context("parsing pipeline config json")?,
            _ => toml::from_str(&content).context("parsing pipeline config toml")?,
        };

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for game in [&mut cfg.primary, &mut cfg.secondary] {
            if let Some(p) = &game.sources_path {
                let full = if p.is_relative() { base.join(p) } else { p.clone() };
                let extra = load_sources_from(&full)?;
                game.sources.extend(extra);
            }
            game.sources = clean_sources(std::mem::take(&mut game.sources));
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Load using env var + fallbacks (see module docs).
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for p in ["config/pipeline.toml", "config/pipeline.json"] {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        let cfg = Self::default();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            bail!("limit must be at least 1");
        }
        if self.window == 0 {
            bail!("window must be at least 1");
        }
        for game in [&self.primary, &self.secondary] {
            if !(DRAW_SIZE as u8..=MAX_DOMAIN).contains(&game.domain_max) {
                bail!(
                    "{}: domain_max {} outside [{DRAW_SIZE}, {MAX_DOMAIN}]",
                    game.name,
                    game.domain_max
                );
            }
            if self.top_k == 0 || self.top_k > usize::from(game.domain_max) {
                bail!("{}: top_k {} outside [1, {}]", game.name, self.top_k, game.domain_max);
            }
            if game.sources.is_empty() {
                bail!("{}: no sources configured", game.name);
            }
            if game.name.trim().is_empty() || game.name.contains(['/', '\\']) {
                bail!("game name {:?} is not a valid file stem", game.name);
            }
        }
        if self.primary.name == self.secondary.name {
            bail!("primary and secondary games share the name {:?}", self.primary.name);
        }
        Ok(())
    }

    pub fn prediction_path(&self) -> PathBuf {
        self.data_dir.join("last_prediction.json")
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.data_dir.join("metrics.prom")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn defaults_are_valid() {
        let cfg = PipelineConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.primary.domain_max, 45);
        assert_eq!(cfg.secondary.domain_max, 55);
        assert_eq!(cfg.retry.retries, 2);
    }

    #[test]
    fn toml_with_sources_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("power_sources.json"),
            r#"[{"name":"extra","url":"https://x.example/p"}]"#,
        )
        .unwrap();
        let p = dir.path().join("pipeline.toml");
        fs::write(
            &p,
            r#"
limit = 40
mode = "merge"

[retry]
retries = 5

[primary]
name = "mega"
domain_max = 45
sources = [{ name = "a", url = "https://a.example/m" }]

[secondary]
name = "power"
domain_max = 55
sources_path = "power_sources.json"
"#,
        )
        .unwrap();
        let cfg = PipelineConfig::load_from(&p).unwrap();
        assert_eq!(cfg.limit, 40);
        assert_eq!(cfg.window, 50);
        assert_eq!(cfg.mode, AcquisitionMode::Merge);
        assert_eq!(cfg.retry.retries, 5);
        assert_eq!(cfg.retry.backoff_ms, 1_500);
        assert_eq!(cfg.secondary.sources[0].name, "extra");
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut cfg = PipelineConfig::default();
        cfg.top_k = 46;
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::default();
        cfg.primary.sources.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = PipelineConfig::default();
        cfg.secondary.domain_max = 120;
        assert!(cfg.validate().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD so the repo's own config/ is not read
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);

        // Nothing on disk → defaults
        let v = PipelineConfig::load_default().unwrap();
        assert_eq!(v, PipelineConfig::default());

        // Fallback TOML in ./config/
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(tmp.path().join("config/pipeline.toml"), "window = 20\n").unwrap();
        assert_eq!(PipelineConfig::load_default().unwrap().window, 20);

        // Env wins
        let p_env = tmp.path().join("other.json");
        fs::write(&p_env, r#"{"window": 7}"#).unwrap();
        env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
        assert_eq!(PipelineConfig::load_default().unwrap().window, 7);

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(PipelineConfig::load_default().is_err());
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
