// Compliance state machine - transition detection and celebration tokens
//
// Tracks the previous compliance value and emits a one-shot event when the
// configured transition occurs. Emitted events expire after a fixed window;
// the machine keeps the active one and drops it once the window passes.
// A separate high-water latch records whether the level ever reached HIGH.

use serde::{Deserialize, Serialize};

use super::classifier::{Category, ComplianceState};
use super::profile::{Mode, ThresholdProfile};

/// Default celebration window in milliseconds
pub const DEFAULT_CELEBRATION_WINDOW_MS: u64 = 3_000;

/// Which compliance transition fires an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// `Exceeding -> WithinLimit` fires `LimitRestored`
    OnRestore,
    /// `WithinLimit -> Exceeding` fires `LimitBreached`
    OnBreach,
}

/// Configured policy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicySetting {
    /// Light mode celebrates restores, hard mode flashes on breaches
    #[default]
    FollowMode,
    OnRestore,
    OnBreach,
}

impl PolicySetting {
    pub fn resolve(self, mode: Mode) -> TriggerPolicy {
        match self {
            PolicySetting::FollowMode => match mode {
                Mode::Light => TriggerPolicy::OnRestore,
                Mode::Hard => TriggerPolicy::OnBreach,
            },
            PolicySetting::OnRestore => TriggerPolicy::OnRestore,
            PolicySetting::OnBreach => TriggerPolicy::OnBreach,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CelebrationReason {
    LimitRestored,
    LimitBreached,
}

/// One-shot transition signal with a bounded active window
///
/// Timestamps are milliseconds since the session started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CelebrationEvent {
    pub reason: CelebrationReason,
    pub triggered_at_ms: u64,
    pub window_ms: u64,
}

impl CelebrationEvent {
    pub fn expires_at_ms(&self) -> u64 {
        self.triggered_at_ms.saturating_add(self.window_ms)
    }

    pub fn is_active_at(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at_ms()
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at_ms().saturating_sub(now_ms)
    }
}

/// Visual intensity derived from category and the high-water latch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Calm,
    Elevated,
    Maximum,
}

impl Intensity {
    pub fn from_category(category: Category) -> Self {
        match category {
            Category::Low => Intensity::Calm,
            Category::Medium => Intensity::Elevated,
            Category::High => Intensity::Maximum,
        }
    }
}

/// One-way, session-scoped flag set once a level reaches HIGH
#[derive(Debug, Default, Clone, Copy)]
pub struct HighWaterLatch {
    latched: bool,
}

impl HighWaterLatch {
    /// Returns the latch state after observing `level`
    pub fn observe(&mut self, level: f64, profile: &ThresholdProfile) -> bool {
        if level >= profile.high() {
            self.latched = true;
        }
        self.latched
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    pub fn intensity(&self, category: Category) -> Intensity {
        if self.latched {
            Intensity::Maximum
        } else {
            Intensity::from_category(category)
        }
    }
}

/// Outcome of one state machine update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Event fired by this update, if any
    pub event: Option<CelebrationEvent>,
    /// Celebration still running after this update (new or earlier)
    pub active: Option<CelebrationEvent>,
    /// High-water latch after this update
    pub latched: bool,
}

#[derive(Debug, Clone)]
pub struct ComplianceMachine {
    previous: Option<ComplianceState>,
    latch: HighWaterLatch,
    active: Option<CelebrationEvent>,
    window_ms: u64,
}

impl ComplianceMachine {
    pub fn new(window_ms: u64) -> Self {
        Self {
            previous: None,
            latch: HighWaterLatch::default(),
            active: None,
            window_ms,
        }
    }

    pub fn previous(&self) -> Option<ComplianceState> {
        self.previous
    }

    pub fn latch(&self) -> &HighWaterLatch {
        &self.latch
    }

    /// Celebration still active at `now_ms`
    pub fn active_celebration(&self, now_ms: u64) -> Option<CelebrationEvent> {
        self.active.filter(|event| event.is_active_at(now_ms))
    }

    /// Feed one classified sample
    ///
    /// Compliance is updated first, the latch second. The first sample only
    /// seeds `previous` and never fires.
    pub fn observe(
        &mut self,
        level: f64,
        current: ComplianceState,
        profile: &ThresholdProfile,
        policy: TriggerPolicy,
        now_ms: u64,
    ) -> Transition {
        if self.active.is_some_and(|event| !event.is_active_at(now_ms)) {
            self.active = None;
        }

        let reason = match (self.previous, current, policy) {
            (
                Some(ComplianceState::Exceeding),
                ComplianceState::WithinLimit,
                TriggerPolicy::OnRestore,
            ) => Some(CelebrationReason::LimitRestored),
            (
                Some(ComplianceState::WithinLimit),
                ComplianceState::Exceeding,
                TriggerPolicy::OnBreach,
            ) => Some(CelebrationReason::LimitBreached),
            _ => None,
        };
        self.previous = Some(current);

        let event = reason.map(|reason| CelebrationEvent {
            reason,
            triggered_at_ms: now_ms,
            window_ms: self.window_ms,
        });
        if event.is_some() {
            self.active = event;
        }

        let latched = self.latch.observe(level, profile);

        Transition {
            event,
            active: self.active,
            latched,
        }
    }
}

impl Default for ComplianceMachine {
    fn default() -> Self {
        Self::new(DEFAULT_CELEBRATION_WINDOW_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ComplianceState::{Exceeding, WithinLimit};

    const SCRIPT: [ComplianceState; 5] = [Exceeding, Exceeding, WithinLimit, WithinLimit, Exceeding];

    fn run_script(policy: TriggerPolicy) -> Vec<Option<CelebrationReason>> {
        let profile = Mode::Light.profile();
        let mut machine = ComplianceMachine::default();
        SCRIPT
            .iter()
            .enumerate()
            .map(|(i, state)| {
                machine
                    .observe(30.0, *state, &profile, policy, i as u64 * 100)
                    .event
                    .map(|e| e.reason)
            })
            .collect()
    }

    #[test]
    fn test_restore_policy_fires_once_on_third_sample() {
        let reasons = run_script(TriggerPolicy::OnRestore);
        assert_eq!(
            reasons,
            vec![None, None, Some(CelebrationReason::LimitRestored), None, None]
        );
    }

    #[test]
    fn test_breach_policy_fires_once_on_fifth_sample() {
        let reasons = run_script(TriggerPolicy::OnBreach);
        assert_eq!(
            reasons,
            vec![None, None, None, None, Some(CelebrationReason::LimitBreached)]
        );
    }

    #[test]
    fn test_first_sample_never_fires() {
        let profile = Mode::Light.profile();
        for policy in [TriggerPolicy::OnRestore, TriggerPolicy::OnBreach] {
            for state in [WithinLimit, Exceeding] {
                let mut machine = ComplianceMachine::default();
                let t = machine.observe(10.0, state, &profile, policy, 0);
                assert!(t.event.is_none());
                assert_eq!(machine.previous(), Some(state));
            }
        }
    }

    #[test]
    fn test_celebration_expires_after_window() {
        let profile = Mode::Light.profile();
        let policy = TriggerPolicy::OnRestore;
        let mut machine = ComplianceMachine::new(3_000);

        machine.observe(45.0, Exceeding, &profile, policy, 0);
        let fired = machine.observe(35.0, WithinLimit, &profile, policy, 1_000);
        let event = fired.event.expect("restore should fire");
        assert_eq!(event.expires_at_ms(), 4_000);
        assert_eq!(fired.active, Some(event));

        let still = machine.observe(35.0, WithinLimit, &profile, policy, 3_999);
        assert!(still.event.is_none());
        assert_eq!(still.active, Some(event));
        assert_eq!(event.remaining_ms(3_999), 1);

        let expired = machine.observe(35.0, WithinLimit, &profile, policy, 4_000);
        assert!(expired.active.is_none());
        assert!(machine.active_celebration(4_000).is_none());
    }

    #[test]
    fn test_new_event_replaces_active_one() {
        let profile = Mode::Light.profile();
        let policy = TriggerPolicy::OnRestore;
        let mut machine = ComplianceMachine::new(3_000);

        machine.observe(45.0, Exceeding, &profile, policy, 0);
        machine.observe(35.0, WithinLimit, &profile, policy, 100);
        machine.observe(45.0, Exceeding, &profile, policy, 200);
        let second = machine.observe(35.0, WithinLimit, &profile, policy, 300);

        assert_eq!(second.active.map(|e| e.triggered_at_ms), Some(300));
    }

    #[test]
    fn test_latch_is_monotonic() {
        let profile = Mode::Light.profile();
        let policy = TriggerPolicy::OnRestore;
        let mut machine = ComplianceMachine::default();

        assert!(!machine.observe(59.9, Exceeding, &profile, policy, 0).latched);
        assert!(machine.observe(60.0, Exceeding, &profile, policy, 10).latched);
        for (i, level) in [10.0, 0.0, 35.0].into_iter().enumerate() {
            let t = machine.observe(level, WithinLimit, &profile, policy, 20 + i as u64);
            assert!(t.latched);
        }
        assert_eq!(machine.latch().intensity(Category::Low), Intensity::Maximum);
    }

    #[test]
    fn test_intensity_without_latch_follows_category() {
        let latch = HighWaterLatch::default();
        assert_eq!(latch.intensity(Category::Low), Intensity::Calm);
        assert_eq!(latch.intensity(Category::Medium), Intensity::Elevated);
        assert_eq!(latch.intensity(Category::High), Intensity::Maximum);
    }

    #[test]
    fn test_follow_mode_policy() {
        assert_eq!(
            PolicySetting::FollowMode.resolve(Mode::Light),
            TriggerPolicy::OnRestore
        );
        assert_eq!(
            PolicySetting::FollowMode.resolve(Mode::Hard),
            TriggerPolicy::OnBreach
        );
        assert_eq!(
            PolicySetting::OnRestore.resolve(Mode::Hard),
            TriggerPolicy::OnRestore
        );
    }
}
