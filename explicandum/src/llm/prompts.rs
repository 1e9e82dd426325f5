//! Prompt templates for persona reasoning and stance extraction
//!
//! Templates use basic `format!()` interpolation for type safety.
//! Missing variables will cause compile-time errors.

use crate::models::{RetrievedContext, Stance, Turn, TurnRole};

/// System framing for the Logic Analyst persona.
pub const LOGIC_ANALYST_FRAMING: &str = "\
You are the Logic Analyst. Examine the user's message for argument structure, \
hidden premises, formal and informal fallacies, and internal consistency. \
Name any fallacy you find explicitly (e.g. \"affirming the consequent\"). \
If the user's message contradicts a stance they previously held, say so and \
cite the earlier stance. Be rigorous and concise. Do not moralize.";

/// System framing for the Philosophy Expert persona.
pub const PHILOSOPHY_EXPERT_FRAMING: &str = "\
You are the Philosophy Expert. Situate the user's message in the relevant \
philosophical tradition: name the positions, thinkers, and standard arguments \
that bear on it, and explain what is at stake in taking one side. Engage with \
the strongest version of the user's view. Be substantive and concise.";

/// Assemble the user-facing prompt for one persona invocation: conversation
/// window, active stances, and retrieved context, then the current message.
///
/// # Example
/// ```
/// use explicandum::llm::prompts::persona_turn_prompt;
///
/// let prompt = persona_turn_prompt("Is free will an illusion?", &[], &[], &[]);
/// assert!(prompt.contains("free will"));
/// ```
pub fn persona_turn_prompt(
    message: &str,
    history: &[Turn],
    stances: &[Stance],
    context: &[RetrievedContext],
) -> String {
    let mut sections = Vec::new();

    if !history.is_empty() {
        let lines = history
            .iter()
            .map(|turn| {
                let speaker = match turn.role {
                    TurnRole::User => "user".to_string(),
                    TurnRole::Persona => turn
                        .persona_id
                        .clone()
                        .unwrap_or_else(|| "persona".to_string()),
                };
                format!("[{}]: {}", speaker, turn.text)
            })
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Recent conversation:\n{lines}"));
    }

    if !stances.is_empty() {
        let lines = stances
            .iter()
            .map(|stance| {
                format!(
                    "- ({}, confidence {:.2}) {}",
                    stance.polarity, stance.confidence, stance.proposition
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!(
            "Stances the user currently holds:\n{lines}"
        ));
    }

    if !context.is_empty() {
        let lines = context
            .iter()
            .map(|item| format!("[{}] {}", item.source_id, item.text))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Supporting context:\n{lines}"));
    }

    sections.push(format!("User message:\n{message}"));

    sections.join("\n\n")
}

/// Generate a prompt for extracting stance changes from a user turn
///
/// Returns a prompt that instructs the LLM to compare the turn against the
/// user's currently active stances and propose changes as a JSON array. An
/// empty array means the turn expressed no stance.
///
/// # Example
/// ```
/// use explicandum::llm::prompts::stance_extraction_prompt;
///
/// let prompt = stance_extraction_prompt("Actually, I no longer think ravens are always black", &[]);
/// assert!(prompt.contains("ravens"));
/// assert!(prompt.contains("JSON"));
/// ```
pub fn stance_extraction_prompt(turn_text: &str, current_stances: &[Stance]) -> String {
    let stance_list = if current_stances.is_empty() {
        "(none)".to_string()
    } else {
        current_stances
            .iter()
            .map(|stance| {
                format!(
                    "[topic: {}] ({}) {}",
                    stance.topic, stance.polarity, stance.proposition
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"Identify positions the user commits to in the following message, compared
against the stances they already hold. Report only genuine commitments, not
questions, hypotheticals, or views the user merely describes.

For each stance the message expresses, produce an object with:
- topic: a short normalized topic phrase (lowercase, reused verbatim from the
  active stance list when the message addresses an existing topic)
- proposition: the claim, phrased as a concise declarative sentence
- polarity: "affirmed", "denied", or "uncertain"
- confidence: a number from 0.0 to 1.0 for how clearly the message commits to it
- retracts: true only if the user explicitly withdraws the position without
  replacing it (e.g. "forget what I said about X")

Active stances:
{stance_list}

User message:
{turn_text}

Respond with valid JSON only. Return an empty array [] if the message expresses
no stance. Example format:
[
  {{"topic": "ravens", "proposition": "Ravens are always black", "polarity": "denied", "confidence": 0.9, "retracts": false}}
]"#
    )
}
