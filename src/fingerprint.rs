//! The data shapes shared by the scanner, scorer and executor.
//!
//! An [`ElementFingerprint`] is a structured, point-in-time description of
//! one document node; a [`PageInventory`] is the full ordered set produced by
//! one scan, plus role groupings. Both serialize cleanly to JSON for
//! inspection tooling.

use crate::dom::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed element category assigned by the scanner's classification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Headline,
    Paragraph,
    Image,
    Link,
    Button,
    Section,
    Grid,
    Container,
    Unknown,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Headline => "headline",
            ElementKind::Paragraph => "paragraph",
            ElementKind::Image => "image",
            ElementKind::Link => "link",
            ElementKind::Button => "button",
            ElementKind::Section => "section",
            ElementKind::Grid => "grid",
            ElementKind::Container => "container",
            ElementKind::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Grouping index bucket used by the inventory and the scorer's pre-filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleGroup {
    Headlines,
    Paragraphs,
    Buttons,
    Images,
    Navigation,
    Other,
}

/// Coarse purpose label with an ordinal importance (1..=7).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SemanticRole {
    pub group: RoleGroup,
    pub importance: u8,
    pub is_main_content: bool,
    pub is_interactive: bool,
}

/// One bounded-depth ancestor summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncestorEntry {
    pub tag: String,
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub classes: Vec<String>,
}

impl fmt::Display for AncestorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        Ok(())
    }
}

/// What lives below a fingerprinted node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescendantSummary {
    pub child_count: usize,
    pub descendant_count: usize,
    pub has_text: bool,
    pub has_heading: bool,
    pub has_image: bool,
    pub has_control: bool,
}

/// Which locator grammar a string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    Identifier,
    TrimmedPath,
    AbsolutePath,
    Text,
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LocatorStrategy::Identifier => "identifier",
            LocatorStrategy::TrimmedPath => "trimmed_path",
            LocatorStrategy::AbsolutePath => "absolute_path",
            LocatorStrategy::Text => "text",
        };
        write!(f, "{name}")
    }
}

/// The three locator strings for one node, ordered most-to-least concise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorSet {
    /// `#identifier` shortcut, present only when the id is stable and unique.
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub identifier: Option<String>,
    /// Last few segments of the structural path, e.g. `section[1]/h1[0]`.
    pub trimmed: String,
    /// Fully general ancestor-index path from the root.
    pub absolute: String,
}

impl LocatorSet {
    /// The ordered strategy list the executor consumes. The literal-text
    /// fallback is appended by the executor itself since it needs the
    /// fingerprint's extracted text.
    pub fn strategies(&self) -> Vec<(LocatorStrategy, String)> {
        let mut out = Vec::with_capacity(3);
        if let Some(identifier) = &self.identifier {
            out.push((LocatorStrategy::Identifier, format!("#{identifier}")));
        }
        out.push((LocatorStrategy::TrimmedPath, self.trimmed.clone()));
        out.push((LocatorStrategy::AbsolutePath, self.absolute.clone()));
        out
    }
}

/// A raw node handle tagged with the generation it was captured at.
///
/// Must be treated as potentially stale the instant any mutation occurs; the
/// executor re-resolves through the scanner whenever the generation no longer
/// matches the live document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeHandle {
    pub node: NodeId,
    pub generation: u64,
}

/// A structured, point-in-time description of one candidate node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementFingerprint {
    /// Stable position in this snapshot's ordering.
    pub index: usize,
    pub kind: ElementKind,
    pub text: String,
    pub text_lower: String,
    pub locators: LocatorSet,
    pub editable: bool,
    pub removable: bool,
    pub bounds: (f64, f64, f64, f64),
    pub visible: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ancestry: Vec<AncestorEntry>,
    /// Nearest landmark section name (`header`, `nav`, `main`, `footer`,
    /// `aside`, or `hero`), if any ancestor is one.
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub landmark: Option<String>,
    pub descendants: DescendantSummary,
    pub role: SemanticRole,
    pub handle: NodeHandle,
}

impl ElementFingerprint {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Role-grouped index over fingerprint indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleGroups {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub headlines: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub paragraphs: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub buttons: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub images: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub navigation: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub other: Vec<usize>,
}

impl RoleGroups {
    pub fn push(&mut self, group: RoleGroup, index: usize) {
        self.bucket_mut(group).push(index);
    }

    pub fn for_group(&self, group: RoleGroup) -> &[usize] {
        match group {
            RoleGroup::Headlines => &self.headlines,
            RoleGroup::Paragraphs => &self.paragraphs,
            RoleGroup::Buttons => &self.buttons,
            RoleGroup::Images => &self.images,
            RoleGroup::Navigation => &self.navigation,
            RoleGroup::Other => &self.other,
        }
    }

    fn bucket_mut(&mut self, group: RoleGroup) -> &mut Vec<usize> {
        match group {
            RoleGroup::Headlines => &mut self.headlines,
            RoleGroup::Paragraphs => &mut self.paragraphs,
            RoleGroup::Buttons => &mut self.buttons,
            RoleGroup::Images => &mut self.images,
            RoleGroup::Navigation => &mut self.navigation,
            RoleGroup::Other => &mut self.other,
        }
    }
}

/// One entry in the shallow landmark structure tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionNode {
    pub name: String,
    pub locator: String,
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub headline: Option<String>,
    pub child_count: usize,
}

/// The full ordered set of fingerprints produced by one scan.
///
/// Created fresh on every scan call and never mutated in place. Inventories
/// from different scans must only be compared by locator/text equality, never
/// by identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInventory {
    pub fingerprints: Vec<ElementFingerprint>,
    pub groups: RoleGroups,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sections: Vec<SectionNode>,
    /// Document generation at scan time.
    pub generation: u64,
}

impl PageInventory {
    pub fn empty() -> Self {
        Self {
            fingerprints: Vec::new(),
            groups: RoleGroups::default(),
            sections: Vec::new(),
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ElementFingerprint> {
        self.fingerprints.get(index)
    }

    /// Fingerprints belonging to one role group, in document order.
    pub fn by_group(&self, group: RoleGroup) -> Vec<&ElementFingerprint> {
        self.groups
            .for_group(group)
            .iter()
            .filter_map(|index| self.fingerprints.get(*index))
            .collect()
    }

    /// First fingerprint whose normalized text equals `text_lower`.
    pub fn find_by_text(&self, text_lower: &str) -> Option<&ElementFingerprint> {
        self.fingerprints
            .iter()
            .find(|fp| fp.text_lower == text_lower)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Helper for clean serialization.
fn is_empty_string(opt: &Option<String>) -> bool {
    match opt {
        Some(s) => s.is_empty(),
        None => true,
    }
}
