// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The maximum number of preferences read for each participant.
/// Any position beyond this one is ignored.
pub const MAX_PREFERENCES: usize = 3;

/// The label displayed instead of a partner when a participant is not matched.
pub const UNMATCHED_LABEL: &str = "unmatched";

/// One of the two disjoint groups of participants.
///
/// Preferences always point to the other group.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Group {
    A,
    B,
}

impl Group {
    pub fn opposite(&self) -> Group {
        match self {
            Group::A => Group::B,
            Group::B => Group::A,
        }
    }

    /// Reads a group from its marker ("A" or "B", case does not matter).
    pub fn from_marker(marker: &str) -> Result<Group, MatchingErrors> {
        match marker.trim() {
            "A" | "a" => Ok(Group::A),
            "B" | "b" => Ok(Group::B),
            x => Err(MatchingErrors::InvalidGroup(x.to_string())),
        }
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Group::A => write!(f, "A"),
            Group::B => write!(f, "B"),
        }
    }
}

/// The identity of a participant: a group and a number.
///
/// The ordering puts all the participants of group A first, each group
/// sorted by number.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct ParticipantId {
    pub group: Group,
    pub number: u32,
}

impl ParticipantId {
    pub fn new(group: Group, number: u32) -> ParticipantId {
        ParticipantId { group, number }
    }
}

impl Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.group, self.number)
    }
}

/// A row as submitted by a participant.
///
/// The preferences are numbers in the opposite group, in order of preference.
/// A `None` is a blank or missing answer.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParticipantRow {
    pub group: Group,
    pub id: u32,
    pub preferences: Vec<Option<u32>>,
}

impl ParticipantRow {
    pub fn participant_id(&self) -> ParticipantId {
        ParticipantId::new(self.group, self.id)
    }
}

// ******** Output data structures *********

/// The ranks that were satisfied by a pair.
///
/// The target is the participant who was being resolved when the pair was
/// committed, the suitor is the participant picked from the target's list.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct RankInfo {
    pub target: ParticipantId,
    pub target_rank: u32,
    pub suitor: ParticipantId,
    pub suitor_rank: u32,
}

impl Display for RankInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}'s rank {}, {}'s rank {})",
            self.target, self.target_rank, self.suitor, self.suitor_rank
        )
    }
}

/// How good a match turned out to be.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum QualityTier {
    Unmatched,
    /// Both sides got their first choice.
    MutualTopChoice,
    /// At least one side got its second or third choice.
    PartialPreference,
}

impl QualityTier {
    pub fn of(rank_info: Option<&RankInfo>) -> QualityTier {
        match rank_info {
            None => QualityTier::Unmatched,
            Some(ri) if ri.target_rank == 1 && ri.suitor_rank == 1 => QualityTier::MutualTopChoice,
            Some(_) => QualityTier::PartialPreference,
        }
    }

    /// Classifies the rendered text of a `RankInfo`.
    ///
    /// This agrees with `QualityTier::of` on every rendered rank description,
    /// and can be used on tables that were already written out.
    pub fn from_rank_text(text: &str) -> QualityTier {
        if text.trim().is_empty() {
            QualityTier::Unmatched
        } else if text.matches("rank 1").count() == 2 {
            QualityTier::MutualTopChoice
        } else {
            QualityTier::PartialPreference
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QualityTier::Unmatched => "unmatched",
            QualityTier::MutualTopChoice => "mutualTopChoice",
            QualityTier::PartialPreference => "partialPreference",
        }
    }
}

/// One line of the final table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MatchRow {
    pub participant: ParticipantId,
    pub partner: Option<ParticipantId>,
    pub rank_info: Option<RankInfo>,
    pub tier: QualityTier,
}

impl MatchRow {
    pub fn partner_label(&self) -> String {
        match self.partner {
            Some(p) => p.to_string(),
            None => UNMATCHED_LABEL.to_string(),
        }
    }

    pub fn rank_label(&self) -> String {
        self.rank_info.map(|ri| ri.to_string()).unwrap_or_default()
    }
}

/// A participant that was referenced by someone else, with the number of
/// participants who referenced it.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct PopularityEntry {
    pub participant: ParticipantId,
    pub score: u32,
}

/// Counts over the rows of a result. Every pair contributes two rows.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct MatchStats {
    pub participants: u32,
    pub pairs: u32,
    pub mutual_top_choice: u32,
    pub partial_preference: u32,
    pub unmatched: u32,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MatchingResult {
    /// Group A first, then group B, each by increasing number.
    pub rows: Vec<MatchRow>,
    /// The participants in the order in which they were considered as targets.
    pub processing_order: Vec<PopularityEntry>,
    pub stats: MatchStats,
}

/// Errors raised while turning text into rows.
///
/// The matching itself cannot fail.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MatchingErrors {
    InvalidGroup(String),
    InvalidNumber(String),
}

impl Error for MatchingErrors {}

impl Display for MatchingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchingErrors::InvalidGroup(s) => write!(f, "invalid group marker: {:?}", s),
            MatchingErrors::InvalidNumber(s) => write!(f, "invalid participant number: {:?}", s),
        }
    }
}

// ********* Configuration **********

/// How participants with the same popularity are ordered before pairing.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// The order in which participants were first referenced, scanning the
    /// preference lists of group A then group B in submission order.
    FirstReference,
    /// Increasing participant id.
    ParticipantOrder,
    // Orders by a SHA-256 digest of the seed and the participant id.
    Random(u32),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MatchRules {
    pub tiebreak_mode: TieBreakMode,
}

impl MatchRules {
    pub const DEFAULT_RULES: MatchRules = MatchRules {
        tiebreak_mode: TieBreakMode::FirstReference,
    };
}

impl Default for MatchRules {
    fn default() -> Self {
        MatchRules::DEFAULT_RULES
    }
}
