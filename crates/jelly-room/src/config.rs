//! The level configuration consumed (not defined) by the authoritative
//! simulation: match thresholds, wave timing, spawn-kind weights, and the
//! handful of tunables gameplay designers iterate on without a rebuild.

use jelly_sim::prelude::WaveConfig;
use serde::{Deserialize, Serialize};

use crate::RoomError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub ring2: f32,
    pub ring3: f32,
    pub win: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ring2: 0.4,
            ring3: 0.75,
            win: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnWeights {
    pub pigment: f32,
    pub neutral: f32,
    pub special: f32,
}

impl Default for SpawnWeights {
    fn default() -> Self {
        Self {
            pigment: 0.6,
            neutral: 0.25,
            special: 0.15,
        }
    }
}

impl SpawnWeights {
    fn sum(&self) -> f32 {
        self.pigment + self.neutral + self.special
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossConfig {
    pub enabled: bool,
    pub hp_multiplier: f32,
    pub spawn_at_match_percent: f32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            hp_multiplier: 6.0,
            spawn_at_match_percent: 0.5,
        }
    }
}

/// Catch-up assistance for a session stuck without ring progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PityConfig {
    pub stuck_threshold_secs: f32,
    pub duration_secs: f32,
    pub multiplier: f32,
}

impl Default for PityConfig {
    fn default() -> Self {
        Self {
            stuck_threshold_secs: 45.0,
            duration_secs: 10.0,
            multiplier: 1.5,
        }
    }
}

/// A temporary penalty applied once an entity commits to the innermost ring,
/// balancing the power granted by the ring-3 buff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ring3Debuff {
    pub speed_mult: f32,
    pub duration_secs: f32,
}

impl Default for Ring3Debuff {
    fn default() -> Self {
        Self {
            speed_mult: 0.85,
            duration_secs: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinCondition {
    FirstToRing3,
    HighestScoreAtTimeLimit,
}

impl Default for WinCondition {
    fn default() -> Self {
        WinCondition::FirstToRing3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveIntervals {
    pub ring1: f32,
    pub ring2: f32,
    pub ring3: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstSizes {
    pub ring1: u32,
    pub ring2: u32,
    pub ring3: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub thresholds: Thresholds,
    pub win_hold_seconds: f32,
    pub time_limit: f32,
    pub wave_intervals: WaveIntervals,
    pub burst_sizes: BurstSizes,
    pub spawn_weights: SpawnWeights,
    pub bot_count: u32,
    pub boss: BossConfig,
    pub pity: PityConfig,
    pub ring3_debuff: Ring3Debuff,
    pub rush_window_duration: f32,
    pub win_condition: WinCondition,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            win_hold_seconds: 5.0,
            time_limit: 300.0,
            wave_intervals: WaveIntervals {
                ring1: 8.0,
                ring2: 6.0,
                ring3: 4.0,
            },
            burst_sizes: BurstSizes {
                ring1: 6,
                ring2: 4,
                ring3: 3,
            },
            spawn_weights: SpawnWeights::default(),
            bot_count: 4,
            boss: BossConfig::default(),
            pity: PityConfig::default(),
            ring3_debuff: Ring3Debuff::default(),
            rush_window_duration: 20.0,
            win_condition: WinCondition::default(),
        }
    }
}

impl LevelConfig {
    /// Validate spawn-weight normalization (invariant: the three weights
    /// must sum to 1 within ±0.01). Called once at room creation; a
    /// malformed config is rejected rather than silently renormalized.
    pub fn validate(&self) -> Result<(), RoomError> {
        let sum = self.spawn_weights.sum();
        if !(0.99..=1.01).contains(&sum) {
            return Err(RoomError::InvalidConfig(format!(
                "spawn weights must sum to ~1.0, got {sum}"
            )));
        }
        Ok(())
    }

    pub fn to_wave_config(&self) -> WaveConfig {
        WaveConfig {
            interval_ring1: self.wave_intervals.ring1,
            interval_ring2: self.wave_intervals.ring2,
            interval_ring3: self.wave_intervals.ring3,
            burst_ring1: self.burst_sizes.ring1,
            burst_ring2: self.burst_sizes.ring2,
            burst_ring3: self.burst_sizes.ring3,
            weight_pigment: self.spawn_weights.pigment,
            weight_neutral: self.spawn_weights.neutral,
            weight_special: self.spawn_weights.special,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(LevelConfig::default().validate().is_ok());
    }

    #[test]
    fn weights_outside_tolerance_are_rejected() {
        let mut config = LevelConfig::default();
        config.spawn_weights = SpawnWeights {
            pigment: 0.5,
            neutral: 0.2,
            special: 0.1,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn weights_within_tolerance_are_accepted() {
        let mut config = LevelConfig::default();
        config.spawn_weights = SpawnWeights {
            pigment: 0.61,
            neutral: 0.25,
            special: 0.15,
        };
        assert!(config.validate().is_ok());
    }
}
