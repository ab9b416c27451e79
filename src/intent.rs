//! Turns a free-text command into an [`Intent`] record.
//!
//! Classification is a thesaurus scan, not language understanding: each
//! action class carries direct verb patterns (heavier weight) and contextual
//! indicator patterns (lighter weight, e.g. the definite article leaning
//! edit). The class with the strictly highest score wins; a nonzero tie is
//! broken by the documented priority add > edit > remove.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const DIRECT_WEIGHT: u32 = 3;
const CONTEXTUAL_WEIGHT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Add,
    Edit,
    Remove,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    First,
    Second,
    Last,
}

/// The classified action plus extracted slot values. Immutable once
/// produced; consumed by the scorer and the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub action: Action,
    /// Canonical element-kind keyword, first dictionary hit wins.
    pub target_type: Option<String>,
    /// Text the target is expected to carry ("that says ...").
    pub target_text: Option<String>,
    /// Replacement text for edits ("to read ...").
    pub new_text: Option<String>,
    pub position: Option<Position>,
    /// Landmark mentioned in the command (hero/header/footer/nav/...).
    pub landmark: Option<String>,
    /// Additive pattern-hit score of the winning class; 0 for Unknown.
    pub confidence: u32,
}

/// Direct and contextual patterns for one action class.
#[derive(Debug, Clone)]
pub struct PatternSet {
    pub direct: Vec<Regex>,
    pub contextual: Vec<Regex>,
}

impl PatternSet {
    fn score(&self, command: &str) -> u32 {
        let direct_hits = self.direct.iter().filter(|p| p.is_match(command)).count() as u32;
        let contextual_hits = self
            .contextual
            .iter()
            .filter(|p| p.is_match(command))
            .count() as u32;
        direct_hits * DIRECT_WEIGHT + contextual_hits * CONTEXTUAL_WEIGHT
    }
}

/// The three action classes' patterns. Passed into the classifier at
/// construction so engine instances stay isolated and tests can substitute
/// fixtures.
#[derive(Debug, Clone)]
pub struct Thesaurus {
    pub add: PatternSet,
    pub edit: PatternSet,
    pub remove: PatternSet,
}

impl Default for Thesaurus {
    fn default() -> Self {
        Self {
            add: PatternSet {
                direct: compile(&[
                    r"\b(add|create|insert|append)\b",
                    r"\bmake\s+(a|an|another)\b",
                    r"\bput\s+(in|up)\b",
                ]),
                contextual: compile(&[
                    r"\b(a|an|another|new)\s+[a-z]",
                    r"\bgive\s+me\s+(a|an)\b",
                ]),
            },
            edit: PatternSet {
                direct: compile(&[
                    r"\b(change|edit|update|modify|rename|rewrite|revise|replace)\b",
                    r"\bmake\s+the\b.*\b(read|say|be)\b",
                    r"\bset\b.*\bto\b",
                ]),
                contextual: compile(&[
                    r"\bthe\s+[a-z]",
                    r"\bto\s+(read|say|be)\b",
                    r"\b(read|say)s?\s*:",
                ]),
            },
            remove: PatternSet {
                direct: compile(&[
                    r"\b(remove|delete|drop|eliminate|erase|discard)\b",
                    r"\bget\s+rid\s+of\b",
                    r"\btake\s+(out|away|down)\b",
                ]),
                contextual: compile(&[r"\bno\s+longer\b", r"\bdon'?t\s+(want|need)\b"]),
            },
        }
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("built-in pattern compiles"))
        .collect()
}

/// Ordered element-kind keyword dictionary. First hit wins, so ordering is
/// the precision/ambiguity knob: more specific phrases come first.
pub fn default_keywords() -> Vec<(&'static str, &'static str)> {
    vec![
        ("text block", "paragraph"),
        ("call to action", "button"),
        ("nav bar", "navigation"),
        ("navigation bar", "navigation"),
        ("headline", "headline"),
        ("heading", "headline"),
        ("title", "headline"),
        ("tagline", "headline"),
        ("subtitle", "headline"),
        ("paragraph", "paragraph"),
        ("copy", "paragraph"),
        ("blurb", "paragraph"),
        ("caption", "paragraph"),
        ("description", "paragraph"),
        ("button", "button"),
        ("cta", "button"),
        ("link", "link"),
        ("anchor", "link"),
        ("image", "image"),
        ("picture", "image"),
        ("photo", "image"),
        ("logo", "image"),
        ("icon", "image"),
        ("banner", "section"),
        ("hero", "section"),
        ("section", "section"),
        ("header", "section"),
        ("footer", "section"),
        ("sidebar", "section"),
        ("navigation", "navigation"),
        ("nav", "navigation"),
        ("menu", "navigation"),
        ("grid", "grid"),
        ("gallery", "grid"),
        ("table", "grid"),
        ("list", "grid"),
        ("card", "container"),
        ("panel", "container"),
        ("box", "container"),
        ("container", "container"),
    ]
}

const LANDMARK_MENTIONS: &[&str] = &["hero", "header", "footer", "nav", "main", "aside"];

/// Classifies command strings into intents using injected tables.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    thesaurus: Thesaurus,
    keywords: Vec<(String, String)>,
    target_text_patterns: Vec<Regex>,
    new_text_patterns: Vec<Regex>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(Thesaurus::default(), default_keywords())
    }
}

impl IntentClassifier {
    pub fn new(thesaurus: Thesaurus, keywords: Vec<(&str, &str)>) -> Self {
        Self {
            thesaurus,
            keywords: keywords
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            target_text_patterns: compile(&[
                // Quoted form matches anywhere, so a trailing "to read ..."
                // clause cannot swallow or break the capture.
                r#"\b(?:that says|saying|containing)\s+['"](?P<t>[^'"]+)['"]"#,
                r#"\bwith\s+['"](?P<t>[^'"]+)['"]"#,
                // Unquoted form runs to the end of the command, minus any
                // replacement-text clause.
                r#"\b(?:that says|saying|containing)\s+(?P<t>[^'"]+?)(?:\s+to\s+(?:read|say|be)\b.*)?\s*$"#,
            ]),
            new_text_patterns: compile(&[
                r#"\bto\s+(?:read|say|be)\s*:?\s*['"]?(?P<t>[^'"]+?)['"]?\s*$"#,
                r#"\b(?:read|say)s?\s*:\s*['"]?(?P<t>[^'"]+?)['"]?\s*$"#,
            ]),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn classify(&self, command: &str) -> Intent {
        let normalized = command.trim().to_lowercase();

        let add = self.thesaurus.add.score(&normalized);
        let edit = self.thesaurus.edit.score(&normalized);
        let remove = self.thesaurus.remove.score(&normalized);

        // Strictly-highest class wins. A nonzero tie falls through to the
        // documented priority: add, then edit, then remove.
        let max = add.max(edit).max(remove);
        let (action, confidence) = if max == 0 {
            (Action::Unknown, 0)
        } else if add == max {
            (Action::Add, add)
        } else if edit == max {
            (Action::Edit, edit)
        } else {
            (Action::Remove, remove)
        };

        let intent = Intent {
            action,
            target_type: self.extract_target_type(&normalized),
            target_text: self.extract_capture(&self.target_text_patterns, command),
            new_text: self.extract_capture(&self.new_text_patterns, command),
            position: extract_position(&normalized),
            landmark: extract_landmark(&normalized),
            confidence,
        };
        debug!(action = ?intent.action, confidence, "command classified");
        intent
    }

    /// First dictionary hit wins. Multi-word keywords match as substrings on
    /// word boundaries; single words also match their plural.
    fn extract_target_type(&self, normalized: &str) -> Option<String> {
        let words: Vec<&str> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        for (keyword, canonical) in &self.keywords {
            let hit = if keyword.contains(' ') {
                normalized.contains(keyword.as_str())
            } else {
                words
                    .iter()
                    .any(|w| *w == keyword || w.strip_suffix('s') == Some(keyword))
            };
            if hit {
                return Some(canonical.clone());
            }
        }
        None
    }

    fn extract_capture(&self, patterns: &[Regex], command: &str) -> Option<String> {
        // Slots are matched against the lowercased command for stability but
        // captured from the original to preserve the user's casing.
        let lowered = command.to_lowercase();
        for pattern in patterns {
            if let Some(m) = pattern.captures(&lowered).and_then(|c| c.name("t")) {
                let captured = command
                    .get(m.start()..m.end())
                    .unwrap_or(m.as_str())
                    .trim();
                if !captured.is_empty() {
                    return Some(captured.to_string());
                }
            }
        }
        None
    }
}

fn extract_position(normalized: &str) -> Option<Position> {
    let words: Vec<&str> = normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.contains(&"first") {
        Some(Position::First)
    } else if words.contains(&"second") {
        Some(Position::Second)
    } else if words.contains(&"last") {
        Some(Position::Last)
    } else {
        None
    }
}

fn extract_landmark(normalized: &str) -> Option<String> {
    LANDMARK_MENTIONS
        .iter()
        .find(|l| {
            normalized
                .split(|c: char| !c.is_alphanumeric())
                .any(|w| w == **l || w.strip_suffix('s') == Some(**l))
        })
        .map(|l| l.to_string())
}
