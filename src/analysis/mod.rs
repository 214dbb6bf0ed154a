// Analysis module - level mapping, classification and compliance tracking
//
// One tick runs frame → level → (category, compliance) → state machine and
// yields a `Reading` for publication.
//
// Architecture:
// - level: spectral frame → bounded level
// - profile: mode → threshold cut points
// - classifier: level + profile → category + compliance
// - compliance: transition events, celebration window, high-water latch
// - NoisePipeline: the four chained, with the mode re-read every tick

use serde::{Deserialize, Serialize};

pub mod classifier;
pub mod compliance;
pub mod level;
pub mod profile;


use crate::audio::AudioFrame;
use crate::config::{AppConfig, ModeHandle};
use crate::error::AnalysisError;
use classifier::{classify, Category, ComplianceState};
use compliance::{CelebrationEvent, ComplianceMachine, Intensity, PolicySetting, TriggerPolicy};
use level::{map_level, LevelScale};
use profile::{Mode, ThresholdProfile};

/// Result of one published tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Level on the configured scale, one decimal place
    pub level: f64,
    /// Mode the reading was classified under
    pub mode: Mode,
    pub category: Category,
    pub compliance: ComplianceState,
    /// Event fired by this tick
    pub event: Option<CelebrationEvent>,
    /// Celebration still running at `timestamp_ms`, fired now or earlier
    pub celebration: Option<CelebrationEvent>,
    pub intensity: Intensity,
    /// High-water latch after this tick
    pub latched: bool,
    /// Milliseconds since the session started
    pub timestamp_ms: u64,
}

impl Reading {
    pub fn is_celebrating(&self) -> bool {
        self.celebration.is_some()
    }

    /// Needle position on the mode's gauge, `0..=1`
    pub fn gauge_fraction(&self) -> f64 {
        ThresholdProfile::gauge_fraction(self.level, self.mode.gauge_range())
    }
}

/// Per-session analysis chain
///
/// Holds the compliance state machine, so previous compliance and the latch
/// live exactly as long as the pipeline.
#[derive(Debug)]
pub struct NoisePipeline {
    scale: LevelScale,
    mode: ModeHandle,
    policy: PolicySetting,
    machine: ComplianceMachine,
}

impl NoisePipeline {
    pub fn new(scale: LevelScale, mode: ModeHandle, policy: PolicySetting, window_ms: u64) -> Self {
        Self {
            scale,
            mode,
            policy,
            machine: ComplianceMachine::new(window_ms),
        }
    }

    pub fn from_config(config: &AppConfig, mode: ModeHandle) -> Result<Self, AnalysisError> {
        Ok(Self::new(
            config.level.scale()?,
            mode,
            config.celebration.policy,
            config.celebration.window_ms,
        ))
    }

    pub fn scale(&self) -> &LevelScale {
        &self.scale
    }

    pub fn mode(&self) -> &ModeHandle {
        &self.mode
    }

    pub fn machine(&self) -> &ComplianceMachine {
        &self.machine
    }

    /// Policy in force for `mode`
    pub fn policy_for(&self, mode: Mode) -> TriggerPolicy {
        self.policy.resolve(mode)
    }

    /// Run one frame through the chain
    ///
    /// # Errors
    /// `InvalidFrame` for an empty frame; the state machine is untouched.
    pub fn process(
        &mut self,
        frame: &AudioFrame,
        timestamp_ms: u64,
    ) -> Result<Reading, AnalysisError> {
        let level = map_level(frame, &self.scale)?;
        Ok(self.process_level(level, timestamp_ms))
    }

    /// Classify an already-mapped level
    pub fn process_level(&mut self, level: f64, timestamp_ms: u64) -> Reading {
        let mode = self.mode.get();
        let profile = mode.profile();
        let classification = classify(level, &profile);
        let policy = self.policy.resolve(mode);

        let transition = self.machine.observe(
            level,
            classification.compliance,
            &profile,
            policy,
            timestamp_ms,
        );

        if let Some(event) = transition.event {
            log::debug!(
                "[NoisePipeline] {:?} at {} ms (level {:.1}, mode {:?})",
                event.reason,
                timestamp_ms,
                level,
                mode
            );
        }

        Reading {
            level,
            mode,
            category: classification.category,
            compliance: classification.compliance,
            event: transition.event,
            celebration: transition.active,
            intensity: self.machine.latch().intensity(classification.category),
            latched: transition.latched,
            timestamp_ms,
        }
    }
}
