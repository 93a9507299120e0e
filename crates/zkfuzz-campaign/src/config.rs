//! Campaign configuration file.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zkfuzz_core::TargetConfig;
use zkfuzz_ir::GenerationConfig;
use zkfuzz_target::{Label, Target};

/// Environment variable naming the config file when no argument is given
pub const CONFIG_ENV: &str = "ZKFUZZ_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Master seed; each target derives its own rng from it
    pub seed: u64,
    pub bundles_per_target: usize,
    pub output_dir: PathBuf,
    pub generation: GenerationConfig,
    pub targets: Vec<TargetConfig>,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            seed: 0xC0FFEE,
            bundles_per_target: 1,
            output_dir: PathBuf::from("./out"),
            generation: GenerationConfig::default(),
            targets: vec![TargetConfig::default()],
        }
    }
}

impl CampaignConfig {
    /// Load from the first argument, else `ZKFUZZ_CONFIG`, else defaults
    pub fn load(arg: Option<String>) -> Result<Self> {
        let path = arg.or_else(|| std::env::var(CONFIG_ENV).ok());
        let config = match path {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Reject configurations that cannot produce a single bundle
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            bail!("no targets configured");
        }
        for target in &self.targets {
            if Target::from_name(&target.name).is_none() {
                bail!("unknown target '{}'", target.name);
            }
        }
        let g = &self.generation;
        if g.min_value > g.max_value
            || g.min_rewrites > g.max_rewrites
            || g.min_batch_size > g.max_batch_size
            || g.min_batch_size == 0
        {
            bail!("invalid generation bounds: {:?}", g);
        }
        Ok(())
    }
}
