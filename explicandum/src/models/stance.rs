use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the user affirms, denies, or is undecided on a proposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Affirmed,
    Denied,
    Uncertain,
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Affirmed => write!(f, "affirmed"),
            Self::Denied => write!(f, "denied"),
            Self::Uncertain => write!(f, "uncertain"),
        }
    }
}

impl Polarity {
    /// Affirmed and Denied contradict each other; Uncertain contradicts
    /// neither.
    pub fn conflicts_with(&self, other: Polarity) -> bool {
        matches!(
            (self, other),
            (Self::Affirmed, Polarity::Denied) | (Self::Denied, Polarity::Affirmed)
        )
    }
}

/// A tracked belief. Stances form a version chain per topic: a new stance
/// with `supersedes` retires the prior entry while history stays intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stance {
    pub id: String,
    /// Normalized proposition topic used as the chain key.
    pub topic: String,
    pub proposition: String,
    pub polarity: Polarity,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub source_turn_id: String,
    /// Id of the stance this one replaces, if any.
    pub supersedes: Option<String>,
    pub retracted: bool,
    pub created_at: DateTime<Utc>,
}

impl Stance {
    pub fn new(
        topic: impl Into<String>,
        proposition: impl Into<String>,
        polarity: Polarity,
        confidence: f64,
        source_turn_id: impl Into<String>,
    ) -> Self {
        Self {
            id: nanoid::nanoid!(),
            topic: topic.into(),
            proposition: proposition.into(),
            polarity,
            confidence: confidence.clamp(0.0, 1.0),
            source_turn_id: source_turn_id.into(),
            supersedes: None,
            retracted: false,
            created_at: Utc::now(),
        }
    }

    pub fn superseding(mut self, prior_id: impl Into<String>) -> Self {
        self.supersedes = Some(prior_id.into());
        self
    }
}

/// Operation the stance extractor proposes against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StanceOperation {
    Add,
    Supersede,
    Retract,
}

/// One proposed mutation of the stance store, traced to a source turn via
/// the embedded stance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StanceDelta {
    pub operation: StanceOperation,
    pub stance: Stance,
}
