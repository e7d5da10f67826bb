use serde::Deserialize;
use std::collections::BTreeSet;

/// Reason contributing negatively to the current concentration score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub enum PenaltyKind {
    #[serde(rename = "IS_ABSENT", alias = "absent")]
    Absent,
    #[serde(rename = "IS_DROWSY", alias = "drowsy")]
    Drowsy,
    #[serde(rename = "IS_LOOKING_AWAY", alias = "looking_away")]
    LookingAway,
}

/// Shown instead of an empty penalty list.
pub const NO_PENALTIES: &str = "No penalties";

impl PenaltyKind {
    pub fn display_text(self) -> &'static str {
        match self {
            PenaltyKind::Absent => "Absent",
            PenaltyKind::Drowsy => "Drowsy",
            PenaltyKind::LookingAway => "Looking away",
        }
    }
}

/// One live measurement as delivered on the `status` channel.
///
/// `overall_score` is on the [0, 100] scale, unlike the historical
/// [`crate::time_series::ScoredInterval`] scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEvent {
    pub overall_score: f64,
    pub accumulated_score: f64,
    pub penalties: BTreeSet<PenaltyKind>,
}

impl ScoreEvent {
    pub fn new(overall_score: f64, accumulated_score: f64) -> Self {
        Self {
            overall_score,
            accumulated_score,
            penalties: BTreeSet::new(),
        }
    }

    pub fn with_penalties(mut self, penalties: impl IntoIterator<Item = PenaltyKind>) -> Self {
        self.penalties.extend(penalties);
        self
    }
}

/// Display lines for a penalty set, in enum order.
pub fn penalty_lines(penalties: &BTreeSet<PenaltyKind>) -> Vec<&'static str> {
    if penalties.is_empty() {
        return vec![NO_PENALTIES];
    }
    penalties.iter().map(|p| p.display_text()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_penalties_map_to_placeholder() {
        assert_eq!(penalty_lines(&BTreeSet::new()), vec![NO_PENALTIES]);
    }

    #[test]
    fn penalties_listed_in_enum_order() {
        let ev = ScoreEvent::new(10.0, 0.0)
            .with_penalties([PenaltyKind::LookingAway, PenaltyKind::Absent]);
        assert_eq!(penalty_lines(&ev.penalties), vec!["Absent", "Looking away"]);
    }

    #[test]
    fn duplicate_penalties_collapse() {
        let ev = ScoreEvent::new(10.0, 0.0)
            .with_penalties([PenaltyKind::Drowsy, PenaltyKind::Drowsy]);
        assert_eq!(ev.penalties.len(), 1);
    }
}
