use crate::models::CritiqueSignal;

/// Kind and trigger phrases for one class of critique signal.
struct SignalPattern {
    kind: &'static str,
    phrases: &'static [&'static str],
}

/// Phrase table scanned against completed persona output. Intentionally
/// simple and fast: plain substring matching, no extra LLM calls.
const SIGNAL_PATTERNS: &[SignalPattern] = &[
    SignalPattern {
        kind: "fallacy",
        phrases: &[
            "fallacy",
            "fallacious",
            "non sequitur",
            "begging the question",
            "affirming the consequent",
            "denying the antecedent",
            "ad hominem",
            "straw man",
            "false dilemma",
            "equivocation",
        ],
    },
    SignalPattern {
        kind: "contradiction",
        phrases: &[
            "contradict",
            "inconsistent",
            "inconsistency",
            "incompatible with your earlier",
        ],
    },
    SignalPattern {
        kind: "hidden_premise",
        phrases: &["hidden premise", "unstated assumption", "implicit assumption"],
    },
];

/// Scans a persona's completed output for critique-worthy findings the
/// persona named in prose, turning them into structured signals.
pub struct CritiqueScanner;

impl CritiqueScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan text and return at most one signal per kind, carrying the first
    /// sentence that triggered it.
    pub fn scan(&self, text: &str) -> Vec<CritiqueSignal> {
        let lower = text.to_lowercase();
        let mut signals = Vec::new();

        for pattern in SIGNAL_PATTERNS {
            let Some(position) = pattern
                .phrases
                .iter()
                .filter_map(|phrase| lower.find(phrase))
                .min()
            else {
                continue;
            };

            signals.push(CritiqueSignal {
                kind: pattern.kind.to_string(),
                detail: sentence_around(text, position),
                turn_id: None,
            });
        }

        signals
    }
}

impl Default for CritiqueScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// The sentence containing byte offset `position`, trimmed. The offset may
/// come from a lowercased copy whose byte layout differs from the original.
fn sentence_around(text: &str, position: usize) -> String {
    let bytes = text.as_bytes();
    let position = position.min(bytes.len());
    let is_boundary = |b: u8| matches!(b, b'.' | b'!' | b'?' | b'\n');

    let start = bytes[..position]
        .iter()
        .rposition(|&b| is_boundary(b))
        .map(|idx| idx + 1)
        .unwrap_or(0);
    let end = bytes[position..]
        .iter()
        .position(|&b| is_boundary(b))
        .map(|idx| position + idx + 1)
        .unwrap_or(text.len());

    text.get(start..end)
        .unwrap_or(text)
        .trim()
        .to_string()
}
