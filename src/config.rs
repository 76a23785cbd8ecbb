//! Mix construction configuration
//!
//! All duration knobs are in milliseconds. Defaults mirror the classic
//! intromix recipe: 5-10 second clips, 1 second edge fades and crossfades.

use crate::mix::effects::EffectVariant;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

fn default_target_ms() -> u64 {
    600_000 // 10:00
}

fn default_crossfade_ms() -> u64 {
    1_000
}

fn default_min_segment_ms() -> u64 {
    5_000
}

fn default_max_segment_ms() -> u64 {
    10_000
}

fn default_min_viable_clip_ms() -> u64 {
    5_000
}

fn default_edge_fade_ms() -> u64 {
    1_000
}

fn default_max_segment_attempts() -> u32 {
    32
}

fn default_tail_effects() -> bool {
    true
}

fn default_enabled_effects() -> Vec<EffectVariant> {
    EffectVariant::default_pool()
}

/// Configuration for one mix construction run
#[derive(Debug, Clone, Deserialize)]
pub struct MixConfig {
    /// Target mix length; the loop stops once elapsed time reaches this
    #[serde(default = "default_target_ms")]
    pub target_ms: u64,

    /// Crossfade overlap between consecutive clips
    #[serde(default = "default_crossfade_ms")]
    pub crossfade_ms: u64,

    /// Minimum extracted segment length
    #[serde(default = "default_min_segment_ms")]
    pub min_segment_ms: u64,

    /// Maximum extracted segment length
    #[serde(default = "default_max_segment_ms")]
    pub max_segment_ms: u64,

    /// Tracks at or below this length are culled from the candidate pool;
    /// a library with nothing above the floor is reported as exhausted
    #[serde(default = "default_min_viable_clip_ms")]
    pub min_viable_clip_ms: u64,

    /// Fade-in/fade-out applied to both edges of every extracted segment
    #[serde(default = "default_edge_fade_ms")]
    pub edge_fade_ms: u64,

    /// Consecutive failed segment attempts tolerated before giving up.
    ///
    /// The original recipe retried forever; a bounded budget turns a
    /// too-short library into a clean error instead of a hang.
    #[serde(default = "default_max_segment_attempts")]
    pub max_segment_attempts: u32,

    /// Run each clip through the tail effect engine before appending
    #[serde(default = "default_tail_effects")]
    pub tail_effects: bool,

    /// Effect variants eligible for random selection
    #[serde(default = "default_enabled_effects")]
    pub enabled_effects: Vec<EffectVariant>,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            target_ms: default_target_ms(),
            crossfade_ms: default_crossfade_ms(),
            min_segment_ms: default_min_segment_ms(),
            max_segment_ms: default_max_segment_ms(),
            min_viable_clip_ms: default_min_viable_clip_ms(),
            edge_fade_ms: default_edge_fade_ms(),
            max_segment_attempts: default_max_segment_attempts(),
            tail_effects: default_tail_effects(),
            enabled_effects: default_enabled_effects(),
        }
    }
}

impl MixConfig {
    /// Default configuration with an explicit target length
    pub fn with_target(target_ms: u64) -> Self {
        Self {
            target_ms,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file; missing keys fall back to defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MixConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate parameter relationships the mix loop depends on
    pub fn validate(&self) -> Result<()> {
        if self.target_ms == 0 {
            return Err(Error::Config("target_ms must be positive".to_string()));
        }
        if self.crossfade_ms == 0 {
            return Err(Error::Config("crossfade_ms must be positive".to_string()));
        }
        if self.min_segment_ms > self.max_segment_ms {
            return Err(Error::Config(format!(
                "min_segment_ms ({}) must not exceed max_segment_ms ({})",
                self.min_segment_ms, self.max_segment_ms
            )));
        }
        if self.min_viable_clip_ms > self.min_segment_ms {
            return Err(Error::Config(format!(
                "min_viable_clip_ms ({}) must not exceed min_segment_ms ({})",
                self.min_viable_clip_ms, self.min_segment_ms
            )));
        }
        if self.crossfade_ms >= self.min_segment_ms {
            return Err(Error::Config(format!(
                "crossfade_ms ({}) must be shorter than min_segment_ms ({})",
                self.crossfade_ms, self.min_segment_ms
            )));
        }
        if self.max_segment_attempts == 0 {
            return Err(Error::Config(
                "max_segment_attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MixConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_ms, 600_000);
        assert_eq!(config.crossfade_ms, 1_000);
        assert_eq!(config.min_segment_ms, 5_000);
        assert_eq!(config.max_segment_ms, 10_000);
        assert!(config.tail_effects);
        assert_eq!(config.enabled_effects, EffectVariant::default_pool());
    }

    #[test]
    fn test_with_target() {
        let config = MixConfig::with_target(120_000);
        assert_eq!(config.target_ms, 120_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_target() {
        let config = MixConfig::with_target(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_segment_bounds() {
        let config = MixConfig {
            min_segment_ms: 12_000,
            max_segment_ms: 10_000,
            ..MixConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_min_viable_above_min_segment() {
        let config = MixConfig {
            min_viable_clip_ms: 6_000,
            ..MixConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_crossfade_not_shorter_than_min_segment() {
        let config = MixConfig {
            crossfade_ms: 5_000,
            ..MixConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let config: MixConfig = toml::from_str(
            r#"
            target_ms = 120000
            crossfade_ms = 500
            enabled_effects = ["tape_stop", "micro_cut"]
            "#,
        )
        .unwrap();
        assert_eq!(config.target_ms, 120_000);
        assert_eq!(config.crossfade_ms, 500);
        assert_eq!(
            config.enabled_effects,
            vec![EffectVariant::TapeStop, EffectVariant::MicroCut]
        );
        // Unspecified keys fall back to defaults
        assert_eq!(config.min_segment_ms, 5_000);
    }
}
