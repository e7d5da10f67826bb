//! Live session state machine.
//!
//! A session is `Dormant` until the accumulated score passes the evolution
//! threshold, then `Evolved` for the rest of its life. While evolved, every
//! score above the activity threshold keeps the companion bouncing.
//! Transitions never look at timestamps: arrival order is authoritative.

use crate::score::{penalty_lines, ScoreEvent};

pub const DEFAULT_EVOLUTION_THRESHOLD: f64 = 5000.0;
pub const DEFAULT_ACTIVITY_THRESHOLD: f64 = 90.0;

/// Pre-evolution shake intensity, derived from `accumulated / threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ShakeTier {
    #[default]
    Level0,
    Level1,
    Level2,
    Level3,
}

impl ShakeTier {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.9 {
            ShakeTier::Level3
        } else if ratio > 0.75 {
            ShakeTier::Level2
        } else if ratio > 0.5 {
            ShakeTier::Level1
        } else {
            ShakeTier::Level0
        }
    }

    /// Horizontal amplitude of the shake, in cells.
    pub fn amplitude(self) -> u16 {
        match self {
            ShakeTier::Level0 => 0,
            ShakeTier::Level1 => 1,
            ShakeTier::Level2 => 2,
            ShakeTier::Level3 => 3,
        }
    }
}

/// The single mutable record of a live session. Only [`SessionMachine`] writes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    accumulated_score: f64,
    evolved: bool,
    active: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulated_score(&self) -> f64 {
        self.accumulated_score
    }

    pub fn is_evolved(&self) -> bool {
        self.evolved
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current shake tier, or `None` once evolved.
    pub fn shake_tier(&self, evolution_threshold: f64) -> Option<ShakeTier> {
        if self.evolved {
            None
        } else {
            Some(ShakeTier::from_ratio(
                self.accumulated_score / evolution_threshold,
            ))
        }
    }
}

/// Side effects requested from the display by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCommand {
    SetScore(f64),
    SetShake(ShakeTier),
    /// Hide the egg, show the creature and play the transform effect.
    Evolve,
    /// Stop the bounce animation and trigger it again from the start.
    RestartBounce,
    SetPenalties(Vec<&'static str>),
}

/// What asked for the active animation to be ensured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationCause {
    Event,
    Poll,
}

/// Decide whether the bounce must restart.
///
/// Events restart it only on a false→true edge of `active`; the poller
/// restarts it whenever the session is active.
pub fn ensure_active_animation(was_active: bool, is_active: bool, cause: AnimationCause) -> bool {
    match cause {
        AnimationCause::Event => is_active && !was_active,
        AnimationCause::Poll => is_active,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionMachine {
    evolution_threshold: f64,
    activity_threshold: f64,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new(DEFAULT_EVOLUTION_THRESHOLD, DEFAULT_ACTIVITY_THRESHOLD)
    }
}

impl SessionMachine {
    /// `evolution_threshold` must be positive; [`crate::config::Config::validate`] enforces it.
    pub fn new(evolution_threshold: f64, activity_threshold: f64) -> Self {
        Self {
            evolution_threshold,
            activity_threshold,
        }
    }

    pub fn evolution_threshold(&self) -> f64 {
        self.evolution_threshold
    }

    pub fn activity_threshold(&self) -> f64 {
        self.activity_threshold
    }

    pub fn apply(&self, state: &mut SessionState, event: &ScoreEvent) -> Vec<DisplayCommand> {
        let mut commands = Vec::with_capacity(3);

        // The transport carries the running total; it is trusted, not summed here.
        state.accumulated_score = event.accumulated_score;
        commands.push(DisplayCommand::SetScore(state.accumulated_score));

        if state.evolved {
            let was_active = state.active;
            state.active = event.overall_score > self.activity_threshold;
            if ensure_active_animation(was_active, state.active, AnimationCause::Event) {
                commands.push(DisplayCommand::RestartBounce);
            }
        } else {
            let ratio = state.accumulated_score / self.evolution_threshold;
            if ratio > 1.0 {
                state.evolved = true;
                tracing::info!(
                    accumulated = state.accumulated_score,
                    threshold = self.evolution_threshold,
                    "session evolved"
                );
                commands.push(DisplayCommand::Evolve);
            } else {
                commands.push(DisplayCommand::SetShake(ShakeTier::from_ratio(ratio)));
            }
        }

        commands.push(DisplayCommand::SetPenalties(penalty_lines(&event.penalties)));
        commands
    }

    /// Repeat-animation poll. Reads the session only; a missing session is inactive.
    pub fn poll(&self, state: Option<&SessionState>) -> Option<DisplayCommand> {
        let active = state.is_some_and(|s| s.evolved && s.active);
        ensure_active_animation(active, active, AnimationCause::Poll)
            .then_some(DisplayCommand::RestartBounce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{PenaltyKind, NO_PENALTIES};

    fn machine() -> SessionMachine {
        SessionMachine::new(1000.0, 90.0)
    }

    fn count(commands: &[DisplayCommand], wanted: &DisplayCommand) -> usize {
        commands.iter().filter(|c| *c == wanted).count()
    }

    fn evolved_state(m: &SessionMachine) -> SessionState {
        let mut state = SessionState::new();
        m.apply(&mut state, &ScoreEvent::new(50.0, 1500.0));
        assert!(state.is_evolved());
        state
    }

    #[test]
    fn shake_tier_boundaries() {
        assert_eq!(ShakeTier::from_ratio(0.0), ShakeTier::Level0);
        assert_eq!(ShakeTier::from_ratio(0.5), ShakeTier::Level0);
        assert_eq!(ShakeTier::from_ratio(0.51), ShakeTier::Level1);
        assert_eq!(ShakeTier::from_ratio(0.75), ShakeTier::Level1);
        assert_eq!(ShakeTier::from_ratio(0.76), ShakeTier::Level2);
        assert_eq!(ShakeTier::from_ratio(0.9), ShakeTier::Level2);
        assert_eq!(ShakeTier::from_ratio(0.91), ShakeTier::Level3);
        assert_eq!(ShakeTier::from_ratio(1.0), ShakeTier::Level3);
    }

    #[test]
    fn increasing_scores_shake_monotonically_and_evolve_once() {
        let m = machine();
        let mut state = SessionState::new();
        let mut last_tier = ShakeTier::Level0;
        let mut evolutions = 0;
        let mut evolved_at = None;

        for (i, acc) in (0..=24).map(|i| i as f64 * 50.0).enumerate() {
            let commands = m.apply(&mut state, &ScoreEvent::new(10.0, acc));
            for c in &commands {
                match c {
                    DisplayCommand::SetShake(tier) => {
                        assert!(*tier >= last_tier);
                        last_tier = *tier;
                    }
                    DisplayCommand::Evolve => {
                        evolutions += 1;
                        evolved_at.get_or_insert(i);
                    }
                    _ => {}
                }
            }
        }

        assert_eq!(evolutions, 1);
        // 1050 is the first total strictly above the threshold.
        assert_eq!(evolved_at, Some(21));
        assert_eq!(last_tier, ShakeTier::Level3);
    }

    #[test]
    fn exactly_threshold_does_not_evolve() {
        let m = machine();
        let mut state = SessionState::new();
        let commands = m.apply(&mut state, &ScoreEvent::new(10.0, 1000.0));
        assert!(!state.is_evolved());
        assert_eq!(count(&commands, &DisplayCommand::Evolve), 0);
        assert_eq!(state.shake_tier(1000.0), Some(ShakeTier::Level3));
    }

    #[test]
    fn evolution_is_permanent() {
        let m = machine();
        let mut state = evolved_state(&m);

        for acc in [0.0, 10.0, 2000.0, 5.0] {
            let commands = m.apply(&mut state, &ScoreEvent::new(99.0, acc));
            assert!(state.is_evolved());
            assert!(!commands
                .iter()
                .any(|c| matches!(c, DisplayCommand::SetShake(_) | DisplayCommand::Evolve)));
        }
        assert_eq!(state.shake_tier(1000.0), None);
    }

    #[test]
    fn evolving_event_does_not_evaluate_activity() {
        let m = machine();
        let mut state = SessionState::new();
        let commands = m.apply(&mut state, &ScoreEvent::new(99.0, 1500.0));
        assert!(state.is_evolved());
        assert!(!state.is_active());
        assert_eq!(count(&commands, &DisplayCommand::RestartBounce), 0);
    }

    #[test]
    fn bounce_restarts_once_per_rising_edge() {
        let m = machine();
        let mut state = evolved_state(&m);
        let mut restarts = 0;
        let mut actives = vec![];

        for score in [95.0, 40.0, 95.0, 95.0] {
            let commands = m.apply(&mut state, &ScoreEvent::new(score, 1600.0));
            restarts += count(&commands, &DisplayCommand::RestartBounce);
            actives.push(state.is_active());
        }

        assert_eq!(actives, vec![true, false, true, true]);
        assert_eq!(restarts, 2);
    }

    #[test]
    fn activity_threshold_is_exclusive() {
        let m = machine();
        let mut state = evolved_state(&m);
        m.apply(&mut state, &ScoreEvent::new(90.0, 1600.0));
        assert!(!state.is_active());
    }

    #[test]
    fn dormant_scores_never_activate() {
        let m = machine();
        let mut state = SessionState::new();
        let commands = m.apply(&mut state, &ScoreEvent::new(100.0, 10.0));
        assert!(!state.is_active());
        assert_eq!(count(&commands, &DisplayCommand::RestartBounce), 0);
    }

    #[test]
    fn poll_tolerates_missing_session() {
        assert_eq!(machine().poll(None), None);
    }

    #[test]
    fn poll_restarts_while_active_without_mutating() {
        let m = machine();
        let mut state = evolved_state(&m);
        assert_eq!(m.poll(Some(&state)), None);

        m.apply(&mut state, &ScoreEvent::new(95.0, 1600.0));
        let before = state.clone();
        assert_eq!(m.poll(Some(&state)), Some(DisplayCommand::RestartBounce));
        assert_eq!(m.poll(Some(&state)), Some(DisplayCommand::RestartBounce));
        assert_eq!(state, before);
    }

    #[test]
    fn penalties_are_recomputed_every_event() {
        let m = machine();
        let mut state = SessionState::new();

        let commands = m.apply(
            &mut state,
            &ScoreEvent::new(30.0, 0.0).with_penalties([PenaltyKind::Absent]),
        );
        assert!(commands.contains(&DisplayCommand::SetPenalties(vec!["Absent"])));

        let commands = m.apply(&mut state, &ScoreEvent::new(30.0, 0.0));
        assert!(commands.contains(&DisplayCommand::SetPenalties(vec![NO_PENALTIES])));
    }

    #[test]
    fn accumulated_score_is_taken_from_event() {
        let m = machine();
        let mut state = SessionState::new();
        m.apply(&mut state, &ScoreEvent::new(30.0, 400.0));
        m.apply(&mut state, &ScoreEvent::new(30.0, 300.0));
        assert_eq!(state.accumulated_score(), 300.0);
    }
}
