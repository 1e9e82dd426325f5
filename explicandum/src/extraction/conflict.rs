use std::collections::HashSet;

use crate::models::Stance;

/// Heuristic topic matcher used to decide whether an extracted proposal
/// addresses a stance the user already holds.
///
/// Intentionally simple and fast, no embeddings and no extra LLM calls:
/// exact topic equality first, then word-overlap between topics, then
/// fuzzy overlap against the stored proposition for proposals whose topic
/// phrasing drifted.
pub struct TopicMatcher;

const TOPIC_OVERLAP_THRESHOLD: f64 = 0.5;
const PROPOSITION_OVERLAP_THRESHOLD: f64 = 0.6;

impl TopicMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Find the stance a proposal topic refers to, if any. `candidates`
    /// should be the currently active stances.
    pub fn match_topic<'a>(&self, topic: &str, candidates: &'a [Stance]) -> Option<&'a Stance> {
        let topic = topic.trim().to_lowercase();
        if topic.is_empty() {
            return None;
        }

        if let Some(exact) = candidates.iter().find(|stance| stance.topic == topic) {
            return Some(exact);
        }

        let mut best: Option<(&Stance, f64)> = None;
        for candidate in candidates {
            let topic_score = word_overlap_score(&topic, &candidate.topic);
            let proposition_score =
                fuzzy_overlap_score(&topic, &candidate.proposition.to_lowercase());

            let score = if topic_score >= TOPIC_OVERLAP_THRESHOLD {
                topic_score
            } else if proposition_score >= PROPOSITION_OVERLAP_THRESHOLD {
                proposition_score
            } else {
                continue;
            };

            if best.map(|(_, s)| score > s).unwrap_or(true) {
                best = Some((candidate, score));
            }
        }

        best.map(|(stance, _)| stance)
    }

    /// Whether two propositions say essentially the same thing. Used to
    /// keep re-extraction of an unchanged stance from producing a delta.
    pub fn propositions_equivalent(&self, a: &str, b: &str) -> bool {
        fuzzy_overlap_score(&a.to_lowercase(), &b.to_lowercase()) >= 0.8
    }
}

impl Default for TopicMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Jaccard-style word overlap between two strings, ignoring one-letter words.
fn word_overlap_score(a: &str, b: &str) -> f64 {
    let words_a: HashSet<&str> = a.split_whitespace().filter(|w| w.len() > 1).collect();
    let words_b: HashSet<&str> = b.split_whitespace().filter(|w| w.len() > 1).collect();

    if words_a.is_empty() && words_b.is_empty() {
        return 1.0;
    }
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();

    intersection as f64 / union as f64
}

/// Word overlap that tolerates inflection: words match when one is a prefix
/// of the other (min 3 chars), so "raven"/"ravens" and "exist"/"exists" line
/// up.
fn fuzzy_overlap_score(a: &str, b: &str) -> f64 {
    let words_a: Vec<&str> = a.split_whitespace().filter(|w| w.len() > 1).collect();
    let words_b: Vec<&str> = b.split_whitespace().filter(|w| w.len() > 1).collect();

    if words_a.is_empty() && words_b.is_empty() {
        return 1.0;
    }
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let matched_a = words_a
        .iter()
        .filter(|wa| words_b.iter().any(|wb| fuzzy_word_match(wa, wb)))
        .count();
    let matched_b = words_b
        .iter()
        .filter(|wb| words_a.iter().any(|wa| fuzzy_word_match(wa, wb)))
        .count();

    let total_unique = words_a.len() + words_b.len() - matched_a.min(matched_b);
    let total_matched = matched_a.max(matched_b);

    total_matched as f64 / total_unique as f64
}

fn fuzzy_word_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let min_len = a.len().min(b.len());
    if min_len < 3 {
        return false;
    }
    a.starts_with(b) || b.starts_with(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Polarity;

    fn stance(topic: &str, proposition: &str) -> Stance {
        Stance::new(topic, proposition, Polarity::Affirmed, 0.8, "t1")
    }

    #[test]
    fn exact_topic_matches() {
        let matcher = TopicMatcher::new();
        let candidates = vec![stance("ravens", "Ravens are always black")];

        let matched = matcher.match_topic("ravens", &candidates);
        assert!(matched.is_some());
    }

    #[test]
    fn overlapping_topic_phrase_matches() {
        let matcher = TopicMatcher::new();
        let candidates = vec![stance("color of ravens", "Ravens are always black")];

        let matched = matcher.match_topic("ravens color", &candidates);
        assert!(matched.is_some());
    }

    #[test]
    fn topic_drifting_toward_proposition_matches() {
        let matcher = TopicMatcher::new();
        let candidates = vec![stance("ravens", "Ravens are always black")];

        let matched = matcher.match_topic("black ravens", &candidates);
        assert!(matched.is_some());
    }

    #[test]
    fn unrelated_topic_does_not_match() {
        let matcher = TopicMatcher::new();
        let candidates = vec![stance("ravens", "Ravens are always black")];

        assert!(matcher.match_topic("free will", &candidates).is_none());
        assert!(matcher.match_topic("", &candidates).is_none());
    }

    #[test]
    fn best_candidate_wins() {
        let matcher = TopicMatcher::new();
        let candidates = vec![
            stance("moral realism", "Moral facts exist"),
            stance("moral responsibility", "People are morally responsible"),
        ];

        let matched = matcher
            .match_topic("moral responsibility", &candidates)
            .unwrap();
        assert_eq!(matched.topic, "moral responsibility");
    }

    #[test]
    fn equivalent_propositions_detected() {
        let matcher = TopicMatcher::new();
        assert!(matcher.propositions_equivalent(
            "Ravens are always black",
            "ravens are always black"
        ));
        assert!(matcher.propositions_equivalent("Free will exists", "Free will exist"));
        assert!(!matcher.propositions_equivalent(
            "Ravens are always black",
            "Free will is an illusion"
        ));
    }

    #[test]
    fn overlap_scores_behave() {
        assert!((word_overlap_score("hello world", "hello world") - 1.0).abs() < f64::EPSILON);
        assert!((word_overlap_score("hello world", "foo bar") - 0.0).abs() < f64::EPSILON);
        assert!(fuzzy_overlap_score("raven exists", "ravens exist") > 0.9);
    }
}
