//! Engine configuration
//!
//! Pacing of the narration timeline and the provider call budget. All
//! delays are synthetic: they order the narration and carry no other
//! meaning.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Narration pacing, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Offsets of the two scheduled consensus entries
    pub scan_narration_offsets_ms: [u64; 2],
    /// Wait after the skeptic engagement entry
    pub skeptic_settle_ms: u64,
    /// Spacing between fallacy entries
    pub fallacy_stagger_ms: u64,
    /// Offset of the stagnation entry
    pub stagnation_offset_ms: u64,
    /// Wait before entering synthesis
    pub skeptic_review_ms: u64,
    /// Wait before completing
    pub synthesis_settle_ms: u64,
}

impl TimelineConfig {
    /// Create default pacing
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-delay pacing; narration still fires in scheduled order
    #[must_use]
    pub fn instant() -> Self {
        Self {
            scan_narration_offsets_ms: [0, 0],
            skeptic_settle_ms: 0,
            fallacy_stagger_ms: 0,
            stagnation_offset_ms: 0,
            skeptic_review_ms: 0,
            synthesis_settle_ms: 0,
        }
    }

    /// With consensus narration offsets
    #[inline]
    #[must_use]
    pub fn with_scan_offsets(mut self, first_ms: u64, second_ms: u64) -> Self {
        self.scan_narration_offsets_ms = [first_ms, second_ms];
        self
    }

    /// With fallacy stagger
    #[inline]
    #[must_use]
    pub fn with_fallacy_stagger(mut self, stagger_ms: u64) -> Self {
        self.fallacy_stagger_ms = stagger_ms;
        self
    }

    /// With stagnation offset
    #[inline]
    #[must_use]
    pub fn with_stagnation_offset(mut self, offset_ms: u64) -> Self {
        self.stagnation_offset_ms = offset_ms;
        self
    }

    /// With the three settle delays
    #[inline]
    #[must_use]
    pub fn with_settles(mut self, skeptic_ms: u64, review_ms: u64, synthesis_ms: u64) -> Self {
        self.skeptic_settle_ms = skeptic_ms;
        self.skeptic_review_ms = review_ms;
        self.synthesis_settle_ms = synthesis_ms;
        self
    }

    /// Consensus narration offsets
    #[must_use]
    pub fn scan_offsets(&self) -> [Duration; 2] {
        self.scan_narration_offsets_ms.map(Duration::from_millis)
    }

    /// Offset of the `index`-th of `count` fallacy entries
    ///
    /// The stagger shrinks when needed so every fallacy fires strictly
    /// before the stagnation entry.
    #[must_use]
    pub fn fallacy_offset(&self, index: usize, count: usize) -> Duration {
        let stagger = if count > 1 && self.stagnation_offset_ms > 0 {
            let ceiling = (self.stagnation_offset_ms - 1) / (count as u64 - 1);
            self.fallacy_stagger_ms.min(ceiling)
        } else if count > 1 {
            0
        } else {
            self.fallacy_stagger_ms
        };
        Duration::from_millis(stagger.saturating_mul(index as u64))
    }

    /// Offset of the stagnation entry
    #[inline]
    #[must_use]
    pub fn stagnation_offset(&self) -> Duration {
        Duration::from_millis(self.stagnation_offset_ms)
    }

    /// Wait after the skeptic engagement entry
    #[inline]
    #[must_use]
    pub fn skeptic_settle(&self) -> Duration {
        Duration::from_millis(self.skeptic_settle_ms)
    }

    /// Wait before entering synthesis
    #[inline]
    #[must_use]
    pub fn skeptic_review(&self) -> Duration {
        Duration::from_millis(self.skeptic_review_ms)
    }

    /// Wait before completing
    #[inline]
    #[must_use]
    pub fn synthesis_settle(&self) -> Duration {
        Duration::from_millis(self.synthesis_settle_ms)
    }

    /// Check internal consistency
    ///
    /// # Errors
    /// - `ConfigError` if consensus offsets are out of order
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [first, second] = self.scan_narration_offsets_ms;
        if first > second {
            return Err(ConfigError::new(
                "timeline.scan_narration_offsets_ms",
                format!("offsets must be non-decreasing, got [{first}, {second}]"),
            ));
        }
        Ok(())
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            scan_narration_offsets_ms: [500, 1500],
            skeptic_settle_ms: 1000,
            fallacy_stagger_ms: 800,
            stagnation_offset_ms: 2500,
            skeptic_review_ms: 3000,
            synthesis_settle_ms: 1500,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Narration pacing
    pub timeline: TimelineConfig,
    /// Budget for one provider call
    pub provider_timeout_secs: u64,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With narration pacing
    #[inline]
    #[must_use]
    pub fn with_timeline(mut self, timeline: TimelineConfig) -> Self {
        self.timeline = timeline;
        self
    }

    /// With provider budget
    #[inline]
    #[must_use]
    pub fn with_provider_timeout(mut self, secs: u64) -> Self {
        self.provider_timeout_secs = secs;
        self
    }

    /// Provider budget as a duration
    #[inline]
    #[must_use]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Check internal consistency
    ///
    /// # Errors
    /// - `ConfigError` if the provider budget is zero or the timeline is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_timeout_secs == 0 {
            return Err(ConfigError::new(
                "engine.provider_timeout_secs",
                "must be greater than zero",
            ));
        }
        self.timeline.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeline: TimelineConfig::default(),
            provider_timeout_secs: 60,
        }
    }
}
