use serde::{Deserialize, Serialize};

pub type MatchId = u64;
pub type PlayerId = u32;
pub type TeamId = u32;

pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventCategory {
    Shot,
    Pass,
    Carry,
    Tackle,
    Interception,
    Block,
    Clearance,
    Recovery,
    Duel,
    Other,
}

impl EventCategory {
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "shot" => Self::Shot,
            "pass" => Self::Pass,
            "carry" => Self::Carry,
            "tackle" => Self::Tackle,
            "interception" => Self::Interception,
            "block" => Self::Block,
            "clearance" => Self::Clearance,
            "recovery" => Self::Recovery,
            "duel" => Self::Duel,
            _ => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Shot => "Shot",
            Self::Pass => "Pass",
            Self::Carry => "Carry",
            Self::Tackle => "Tackle",
            Self::Interception => "Interception",
            Self::Block => "Block",
            Self::Clearance => "Clearance",
            Self::Recovery => "Recovery",
            Self::Duel => "Duel",
            Self::Other => "Other",
        }
    }
}

impl From<String> for EventCategory {
    fn from(raw: String) -> Self {
        Self::from_label(&raw)
    }
}

impl From<EventCategory> for String {
    fn from(category: EventCategory) -> Self {
        category.label().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventOutcome {
    Successful,
    Unsuccessful,
    Goal,
    Other,
}

impl EventOutcome {
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "successful" => Self::Successful,
            "unsuccessful" => Self::Unsuccessful,
            "goal" => Self::Goal,
            _ => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Successful => "Successful",
            Self::Unsuccessful => "Unsuccessful",
            Self::Goal => "Goal",
            Self::Other => "Other",
        }
    }
}

impl From<String> for EventOutcome {
    fn from(raw: String) -> Self {
        Self::from_label(&raw)
    }
}

impl From<EventOutcome> for String {
    fn from(outcome: EventOutcome) -> Self {
        outcome.label().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchPoint {
    pub x: f64,
    pub y: f64,
}

/// One row of the upstream event feed. Read-only for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub team_id: TeamId,
    pub timestamp_seconds: f64,
    pub category: EventCategory,
    #[serde(default)]
    pub outcome: Option<EventOutcome>,
    #[serde(default)]
    pub spatial_start: Option<PitchPoint>,
    #[serde(default)]
    pub spatial_end: Option<PitchPoint>,
    #[serde(default)]
    pub episode_id: Option<u64>,
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchInfo {
    pub match_id: MatchId,
    /// Chronological key. `YYYY-MM-DD` or `YYYY-MM-DD HH:MM[:SS]`.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
}

impl RawEvent {
    fn is(&self, category: EventCategory) -> bool {
        self.category == category
    }

    fn outcome_is(&self, outcome: EventOutcome) -> bool {
        self.outcome == Some(outcome)
    }

    pub fn is_shot(&self) -> bool {
        self.is(EventCategory::Shot)
    }

    pub fn is_shot_on_target(&self) -> bool {
        self.is_shot() && self.outcome_is(EventOutcome::Successful)
    }

    pub fn is_goal(&self) -> bool {
        self.is_shot() && self.outcome_is(EventOutcome::Goal)
    }

    pub fn is_pass(&self) -> bool {
        self.is(EventCategory::Pass)
    }

    pub fn is_successful_pass(&self) -> bool {
        self.is_pass() && self.outcome_is(EventOutcome::Successful)
    }

    pub fn is_failed_pass(&self) -> bool {
        self.is_pass() && self.outcome_is(EventOutcome::Unsuccessful)
    }

    pub fn is_carry(&self) -> bool {
        self.is(EventCategory::Carry)
    }

    /// Carry that moves the ball forward by more than `threshold` pitch units.
    /// Without both coordinates the carry never counts as progressive.
    pub fn is_progressive_carry(&self, threshold: f64) -> bool {
        if !self.is_carry() {
            return false;
        }
        let (Some(start), Some(end)) = (self.spatial_start, self.spatial_end) else {
            return false;
        };
        end.x > start.x + threshold
    }

    pub fn is_tackle(&self) -> bool {
        self.is(EventCategory::Tackle)
    }

    pub fn is_successful_tackle(&self) -> bool {
        self.is_tackle() && self.outcome_is(EventOutcome::Successful)
    }

    pub fn is_interception(&self) -> bool {
        self.is(EventCategory::Interception)
    }

    pub fn is_block(&self) -> bool {
        self.is(EventCategory::Block)
    }

    pub fn is_clearance(&self) -> bool {
        self.is(EventCategory::Clearance)
    }

    pub fn is_recovery(&self) -> bool {
        self.is(EventCategory::Recovery)
    }

    pub fn is_duel(&self) -> bool {
        self.is(EventCategory::Duel)
    }

    pub fn is_duel_won(&self) -> bool {
        self.is_duel() && self.outcome_is(EventOutcome::Successful)
    }

    pub fn player_name_or_unknown(&self) -> String {
        label_or_unknown(self.player_name.as_deref())
    }

    pub fn team_name_or_unknown(&self) -> String {
        label_or_unknown(self.team_name.as_deref())
    }

    pub fn position_or_unknown(&self) -> String {
        label_or_unknown(self.position.as_deref())
    }
}

fn label_or_unknown(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => UNKNOWN_LABEL.to_string(),
    }
}
