//! Ranks inventory entries against an intent and resolves the single best
//! target, or "no match".
//!
//! Scoring is pure: the same inventory and intent always produce the same
//! ranking. Equal top scores fall back to the lowest snapshot index so the
//! outcome never depends on incidental ordering.

use crate::fingerprint::{ElementFingerprint, ElementKind, PageInventory, RoleGroup};
use crate::intent::{Action, Intent, Position};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Weighted factors, highest to lowest. Injected at construction so tests
/// can substitute fixtures and multiple engines stay isolated.
#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub exact_text: i64,
    /// Scaled by the match-length ratio before being applied.
    pub partial_text: i64,
    /// Requires at least half the target's words to be present.
    pub fuzzy_text: i64,
    pub kind_exact: i64,
    pub kind_partial: i64,
    pub role_alignment: i64,
    pub position: i64,
    pub editable_bonus: i64,
    pub visible: i64,
    /// Multiplier applied to the fingerprint's 1..=7 importance ordinal.
    pub importance_scale: i64,
    pub landmark: i64,
    /// Acceptance gate: a top score below this resolves to no match.
    pub min_score: i64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            exact_text: 200,
            partial_text: 60,
            fuzzy_text: 30,
            kind_exact: 25,
            kind_partial: 15,
            role_alignment: 12,
            position: 10,
            editable_bonus: 8,
            visible: 4,
            importance_scale: 1,
            landmark: 3,
            min_score: 20,
        }
    }
}

/// One ranked candidate. Purely derived; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub fingerprint: ElementFingerprint,
    pub score: i64,
    pub reasons: Vec<String>,
}

/// Maps a canonical target-type keyword onto the inventory's role groups.
/// Keywords without a group (section, grid, container) scan the whole
/// inventory.
fn group_for_keyword(keyword: &str) -> Option<RoleGroup> {
    match keyword {
        "headline" => Some(RoleGroup::Headlines),
        "paragraph" => Some(RoleGroup::Paragraphs),
        "button" | "link" => Some(RoleGroup::Buttons),
        "image" => Some(RoleGroup::Images),
        "navigation" => Some(RoleGroup::Navigation),
        _ => None,
    }
}

fn kind_for_keyword(keyword: &str) -> Option<ElementKind> {
    match keyword {
        "headline" => Some(ElementKind::Headline),
        "paragraph" => Some(ElementKind::Paragraph),
        "button" => Some(ElementKind::Button),
        "link" => Some(ElementKind::Link),
        "image" => Some(ElementKind::Image),
        "section" | "navigation" => Some(ElementKind::Section),
        "grid" => Some(ElementKind::Grid),
        "container" => Some(ElementKind::Container),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateScorer {
    weights: ScoringWeights,
}

impl CandidateScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Scores every candidate in the (pre-filtered) inventory, descending.
    #[instrument(level = "debug", skip(self, inventory, intent))]
    pub fn score(&self, inventory: &PageInventory, intent: &Intent) -> Vec<ScoredCandidate> {
        let candidate_indices = self.candidate_indices(inventory, intent);
        let field_size = candidate_indices.len();

        let mut scored: Vec<ScoredCandidate> = candidate_indices
            .iter()
            .enumerate()
            .filter_map(|(ordinal, index)| {
                let fp = inventory.get(*index)?;
                let (score, reasons) = self.score_one(fp, intent, ordinal, field_size);
                Some(ScoredCandidate {
                    fingerprint: fp.clone(),
                    score,
                    reasons,
                })
            })
            .collect();

        sort_ranked(&mut scored);
        self.apply_editable_mismatch(&mut scored, intent);
        debug!(
            candidates = scored.len(),
            top_score = scored.first().map(|c| c.score).unwrap_or(0),
            "scoring complete"
        );
        scored
    }

    /// Picks the single best candidate, or `None` when nothing clears the
    /// acceptance gate. Add intents perform no candidate search at all:
    /// creation is delegated, never faked via resolution.
    pub fn resolve(&self, inventory: &PageInventory, intent: &Intent) -> Option<ElementFingerprint> {
        if intent.action == Action::Add {
            return None;
        }
        let ranked = self.score(inventory, intent);
        let top = ranked.into_iter().next()?;
        if top.score >= self.weights.min_score {
            debug!(index = top.fingerprint.index, score = top.score, "target resolved");
            Some(top.fingerprint)
        } else {
            debug!(
                score = top.score,
                gate = self.weights.min_score,
                "best candidate below acceptance gate"
            );
            None
        }
    }

    /// Pre-filter: when the target type maps to a known role group, only that
    /// group competes. This keeps an inert span with matching text from ever
    /// outranking an actual button once the type is pinned.
    fn candidate_indices(&self, inventory: &PageInventory, intent: &Intent) -> Vec<usize> {
        if let Some(group) = intent.target_type.as_deref().and_then(group_for_keyword) {
            return inventory.groups.for_group(group).to_vec();
        }
        (0..inventory.len()).collect()
    }

    fn score_one(
        &self,
        fp: &ElementFingerprint,
        intent: &Intent,
        ordinal: usize,
        field_size: usize,
    ) -> (i64, Vec<String>) {
        let w = &self.weights;
        let mut score = 0i64;
        let mut reasons = Vec::new();

        if let Some(target_text) = intent.target_text.as_deref() {
            let needle = target_text.trim().to_lowercase();
            if !needle.is_empty() {
                if fp.text_lower == needle {
                    score += w.exact_text;
                    reasons.push("exact text match".to_string());
                } else if fp.text_lower.contains(&needle) {
                    let ratio = needle.len() as f64 / fp.text_lower.len().max(1) as f64;
                    let points = (w.partial_text as f64 * ratio).round() as i64;
                    score += points;
                    reasons.push(format!("partial text match ({points} pts)"));
                } else if token_overlap(&needle, &fp.text_lower) >= 0.5 {
                    score += w.fuzzy_text;
                    reasons.push("fuzzy token overlap".to_string());
                }
            }
        }

        if let Some(keyword) = intent.target_type.as_deref() {
            match kind_for_keyword(keyword) {
                Some(kind) if kind == fp.kind => {
                    score += w.kind_exact;
                    reasons.push(format!("kind match ({kind})"));
                }
                Some(_) if group_for_keyword(keyword) == Some(fp.role.group) => {
                    score += w.kind_partial;
                    reasons.push("related kind".to_string());
                }
                _ => {}
            }
            if group_for_keyword(keyword) == Some(fp.role.group) {
                score += w.role_alignment;
                reasons.push("role group alignment".to_string());
            }
        }

        if let Some(position) = intent.position {
            let aligned = match position {
                Position::First => ordinal == 0,
                Position::Second => ordinal == 1,
                Position::Last => field_size > 0 && ordinal == field_size - 1,
            };
            if aligned {
                score += w.position;
                reasons.push(format!("position match ({position:?})"));
            }
        }

        if fp.editable {
            score += w.editable_bonus;
            reasons.push("editable".to_string());
        }
        if fp.visible {
            score += w.visible;
        }
        score += i64::from(fp.role.importance) * w.importance_scale;

        if let Some(landmark) = intent.landmark.as_deref() {
            if fp.landmark.as_deref() == Some(landmark) {
                score += w.landmark;
                reasons.push(format!("inside mentioned landmark ({landmark})"));
            }
        }

        (score, reasons)
    }

    /// Editable-mismatch rule: an edit whose top pick lacks the edit
    /// affordance gets its score halved (not discarded), and one secondary
    /// pass prefers an editable fingerprint with identical text if present.
    fn apply_editable_mismatch(&self, scored: &mut Vec<ScoredCandidate>, intent: &Intent) {
        if intent.action != Action::Edit {
            return;
        }
        let Some(top) = scored.first() else {
            return;
        };
        if top.fingerprint.editable {
            return;
        }
        let halved = top.score / 2;
        scored[0].score = halved;
        scored[0]
            .reasons
            .push("edit target not editable; score halved".to_string());
        let text = scored[0].fingerprint.text_lower.clone();
        sort_ranked(scored);

        if !scored[0].fingerprint.editable {
            if let Some(twin) = scored
                .iter()
                .position(|c| c.fingerprint.editable && c.fingerprint.text_lower == text)
            {
                let mut preferred = scored.remove(twin);
                preferred
                    .reasons
                    .push("editable twin preferred over inert match".to_string());
                scored.insert(0, preferred);
            }
        }
    }
}

fn sort_ranked(scored: &mut [ScoredCandidate]) {
    // Descending score; equal scores resolve to earliest document order.
    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.fingerprint.index.cmp(&b.fingerprint.index))
    });
}

/// Share of the needle's words present in the haystack.
fn token_overlap(needle: &str, haystack: &str) -> f64 {
    let needle_words: Vec<&str> = needle.split_whitespace().collect();
    if needle_words.is_empty() {
        return 0.0;
    }
    let hits = needle_words
        .iter()
        .filter(|word| haystack.split_whitespace().any(|h| h == **word))
        .count();
    hits as f64 / needle_words.len() as f64
}
