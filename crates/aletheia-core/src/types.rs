//! Core types for Aletheia
//!
//! Defines the fundamental data model of a dialectical analysis:
//! - Phases of a run and the agents that narrate them
//! - Log entries shown to the viewer
//! - The normalized analysis result and its bounded scores

use crate::error::ScoreOutOfRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Product name shown by front ends
pub const APP_NAME: &str = "ALETHEIA";

/// Product version string
pub const APP_VERSION: &str = "1.0.0-OBSIDIAN";

/// Discrete stage of one analysis run
///
/// Exactly one phase is active per session. Wire names match the
/// upper-case identifiers consumed by display layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for a query
    #[default]
    #[serde(rename = "IDLE")]
    Idle,
    /// Mapping the consensus view while the provider call is in flight
    #[serde(rename = "SCANNING")]
    Scanning,
    /// Stress-testing the consensus
    #[serde(rename = "SKEPTIC")]
    SkepticReview,
    /// Resolving the dialectic into a synthesis
    #[serde(rename = "SYNTHESIS")]
    Synthesizing,
    /// Result available
    #[serde(rename = "COMPLETE")]
    Complete,
}

impl Phase {
    /// All phases, in run order
    pub const ALL: [Phase; 5] = [
        Phase::Idle,
        Phase::Scanning,
        Phase::SkepticReview,
        Phase::Synthesizing,
        Phase::Complete,
    ];

    /// Wire name of the phase
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::Scanning => "SCANNING",
            Phase::SkepticReview => "SKEPTIC",
            Phase::Synthesizing => "SYNTHESIS",
            Phase::Complete => "COMPLETE",
        }
    }

    /// True while a run is in progress
    #[inline]
    #[must_use]
    pub fn is_working(&self) -> bool {
        matches!(
            self,
            Phase::Scanning | Phase::SkepticReview | Phase::Synthesizing
        )
    }

    /// True for the phases a run may settle in
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Idle | Phase::Complete)
    }

    /// Whether a submission from this phase starts a run without
    /// abandoning another one
    #[inline]
    #[must_use]
    pub fn accepts_submit(&self) -> bool {
        self.is_terminal()
    }

    /// Progress banner for working phases
    #[must_use]
    pub fn status_label(&self) -> Option<&'static str> {
        match self {
            Phase::Scanning => Some("MAPPING CONSENSUS"),
            Phase::SkepticReview => Some("STRESS-TESTING LOGIC"),
            Phase::Synthesizing => Some("SYNTHESIZING TRUTH"),
            Phase::Idle | Phase::Complete => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Narrating voice of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Agent {
    /// Maps what everyone believes
    Consensus,
    /// Attacks the consensus
    Skeptic,
    /// Resolves the conflict
    Synthesizer,
    /// The engine itself
    System,
}

impl Agent {
    /// Wire name of the agent
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Agent::Consensus => "CONSENSUS",
            Agent::Skeptic => "SKEPTIC",
            Agent::Synthesizer => "SYNTHESIZER",
            Agent::System => "SYSTEM",
        }
    }

    /// Long-form name shown next to the agent's output
    #[inline]
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Agent::Consensus => "AGENT A [MIMETIC]",
            Agent::Skeptic => "AGENT B [ADVERSARIAL]",
            Agent::Synthesizer => "AGENT C [THIELIAN]",
            Agent::System => "SYSTEM",
        }
    }
}

impl std::fmt::Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique log entry identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogEntryId(pub Ulid);

impl LogEntryId {
    /// Generate new entry ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for LogEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LogEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One narration line in the log stream
///
/// Immutable once created: fields are only readable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    id: LogEntryId,
    agent: Agent,
    message: String,
    timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Create an entry stamped with the current time
    #[must_use]
    pub fn new(agent: Agent, message: impl Into<String>) -> Self {
        Self::at(agent, message, Utc::now())
    }

    /// Create an entry with an explicit timestamp
    #[must_use]
    pub fn at(agent: Agent, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: LogEntryId::new(),
            agent,
            message: message.into(),
            timestamp,
        }
    }

    /// Entry ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> LogEntryId {
        self.id
    }

    /// Narrating agent
    #[inline]
    #[must_use]
    pub fn agent(&self) -> Agent {
        self.agent
    }

    /// Message text
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Time of append
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Whole percentage in `[0, 100]`
///
/// The range is enforced at construction, so any `Score` in hand is valid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    /// Lowest score
    pub const MIN: Score = Score(0);
    /// Highest score
    pub const MAX: Score = Score(100);

    /// Create a score, rejecting values above 100
    #[inline]
    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        (value <= 100).then_some(Self(value))
    }

    /// Create a score, clamping into range
    #[inline]
    #[must_use]
    pub fn saturating(value: i64) -> Self {
        // clamp guarantees the cast is lossless
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Self(value.clamp(0, 100) as u8)
    }

    /// Numeric value
    #[inline]
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = ScoreOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ScoreOutOfRange(value))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the herd believes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusSection {
    /// Dominant narrative
    pub theme: String,
    /// Supporting beliefs
    pub points: Vec<String>,
    /// How crowded the space is
    pub market_saturation: Score,
}

/// The attack on the consensus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkepticSection {
    /// Logical fallacies found in the consensus
    pub fallacies: Vec<String>,
    /// Where the market stopped moving
    pub stagnation_point: String,
    /// Imitation traps competitors fall into
    pub mimetic_traps: Vec<String>,
}

/// The contrarian opportunity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisSection {
    /// The secret nobody admits
    pub secret: String,
    /// How to own the vertical
    pub vertical_strategy: String,
    /// Size of the opportunity
    pub opportunity_score: Score,
}

/// Citation backing the analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    /// Human-readable title
    pub title: String,
    /// Location of the source
    pub uri: String,
}

/// Contract-safe analysis result
///
/// Only produced by [`crate::normalize::normalize`]; every field is
/// present and both scores are within `[0, 100]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Consensus view
    pub consensus: ConsensusSection,
    /// Skeptic view
    pub skeptic: SkepticSection,
    /// Synthesis
    pub synthesis: SynthesisSection,
    /// Citations, empty when the provider supplies none
    #[serde(default)]
    pub sources: Vec<SourceCitation>,
}

impl AnalysisResult {
    /// First `n` citations, as shown in the dossier
    #[must_use]
    pub fn top_sources(&self, n: usize) -> &[SourceCitation] {
        &self.sources[..self.sources.len().min(n)]
    }
}
