use serde::{Deserialize, Serialize};

use crate::models::Polarity;

/// Wire shape of one stance proposal in the extraction LLM response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedStance {
    pub topic: String,
    pub proposition: String,
    pub polarity: String,
    pub confidence: f64,
    #[serde(default)]
    pub retracts: bool,
}

impl ProposedStance {
    /// Parse the polarity string leniently; models occasionally vary casing.
    pub fn parsed_polarity(&self) -> Option<Polarity> {
        match self.polarity.trim().to_lowercase().as_str() {
            "affirmed" | "affirm" | "affirms" => Some(Polarity::Affirmed),
            "denied" | "deny" | "denies" => Some(Polarity::Denied),
            "uncertain" | "unsure" => Some(Polarity::Uncertain),
            _ => None,
        }
    }

    /// Normalized topic used as the version-chain key.
    pub fn normalized_topic(&self) -> String {
        self.topic.trim().to_lowercase()
    }
}
