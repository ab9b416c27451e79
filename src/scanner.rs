//! Walks a target document and emits an ordered inventory of element
//! fingerprints plus a semantic-role index.
//!
//! The scanner is total and read-only: it never errors and never touches the
//! document. An absent surface is a normal outcome and yields an empty
//! inventory.

use crate::dom::{Document, NodeId, NodeRecord};
use crate::fingerprint::{
    AncestorEntry, DescendantSummary, ElementFingerprint, ElementKind, LocatorSet, NodeHandle,
    PageInventory, RoleGroup, RoleGroups, SectionNode, SemanticRole,
};
use tracing::{debug, instrument};

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const CONTROL_TAGS: &[&str] = &["a", "button"];
const LANDMARK_TAGS: &[&str] = &["header", "nav", "main", "footer", "aside"];

/// The closed set of tags worth fingerprinting even without affordances.
const MEANINGFUL_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "a", "button", "img", "section", "article", "nav",
    "header", "footer", "main", "aside", "figure", "ul", "ol", "table",
];

/// Pure tag/class/shape classification into the closed element category.
pub fn classify_kind(tag: &str, classes: &[String], descendants: &DescendantSummary) -> ElementKind {
    if HEADING_TAGS.contains(&tag) {
        return ElementKind::Headline;
    }
    match tag {
        "p" => return ElementKind::Paragraph,
        "img" | "figure" => return ElementKind::Image,
        "a" => return ElementKind::Link,
        "button" => return ElementKind::Button,
        "ul" | "ol" | "table" => return ElementKind::Grid,
        "section" | "article" | "nav" | "header" | "footer" | "main" | "aside" => {
            return ElementKind::Section
        }
        _ => {}
    }
    // Class-name keywords decide generic containers.
    let class_has = |needles: &[&str]| {
        classes
            .iter()
            .any(|c| needles.iter().any(|n| c.to_lowercase().contains(n)))
    };
    if class_has(&["headline", "heading", "title"]) {
        return ElementKind::Headline;
    }
    if class_has(&["btn", "button", "cta"]) {
        return ElementKind::Button;
    }
    if class_has(&["grid", "row", "columns", "gallery", "cards"]) {
        return ElementKind::Grid;
    }
    // Content shape: a container holding a heading reads as a section.
    if descendants.has_heading {
        return ElementKind::Section;
    }
    if tag == "div" || tag == "span" {
        return ElementKind::Container;
    }
    ElementKind::Unknown
}

/// Maps an element kind (and its tag) into the inventory's role groups.
fn group_for(kind: ElementKind, tag: &str) -> RoleGroup {
    if tag == "nav" {
        return RoleGroup::Navigation;
    }
    match kind {
        ElementKind::Headline => RoleGroup::Headlines,
        ElementKind::Paragraph => RoleGroup::Paragraphs,
        ElementKind::Button | ElementKind::Link => RoleGroup::Buttons,
        ElementKind::Image => RoleGroup::Images,
        _ => RoleGroup::Other,
    }
}

/// Fixed tag/class table for importance. Heading level inversely sets
/// importance; interactive/nav/hero elements land mid-to-high; footers and
/// generic containers land low.
fn importance_for(tag: &str, classes: &[String], kind: ElementKind, landmark: Option<&str>) -> u8 {
    if let Some(level) = tag.strip_prefix('h').and_then(|l| l.parse::<u8>().ok()) {
        if (1..=6).contains(&level) {
            return 8 - level.min(6);
        }
    }
    let hero_marked = landmark == Some("hero")
        || classes.iter().any(|c| c.to_lowercase().contains("hero"));
    if hero_marked {
        return 6;
    }
    match kind {
        ElementKind::Button | ElementKind::Link => 5,
        ElementKind::Image => 4,
        ElementKind::Paragraph => 3,
        ElementKind::Section if tag == "nav" => 5,
        ElementKind::Section if tag == "footer" => 1,
        ElementKind::Section => 3,
        ElementKind::Grid => 2,
        _ => 1,
    }
}

/// Configuration for a scan pass. All bounds are fixed constants by default.
#[derive(Debug, Clone)]
pub struct PageScanner {
    /// Extracted text is truncated with an ellipsis past this length.
    pub text_max: usize,
    /// Ancestor summaries are captured up to this depth.
    pub ancestry_depth: usize,
    /// Structural paths are trimmed to this many trailing segments.
    pub trimmed_segments: usize,
}

impl Default for PageScanner {
    fn default() -> Self {
        Self {
            text_max: 80,
            ancestry_depth: 5,
            trimmed_segments: 3,
        }
    }
}

impl PageScanner {
    /// Snapshots the document into a fresh [`PageInventory`].
    ///
    /// `None` means no target surface is available, which is a normal,
    /// non-error outcome: the result is an empty inventory.
    #[instrument(level = "debug", skip(self, document))]
    pub fn scan(&self, document: Option<&Document>) -> PageInventory {
        let Some(document) = document else {
            debug!("no target surface; returning empty inventory");
            return PageInventory::empty();
        };

        let generation = document.generation();
        let mut fingerprints = Vec::new();
        let mut groups = RoleGroups::default();
        let mut sections = Vec::new();

        for id in document.walk() {
            let Some(record) = document.node(id) else {
                continue;
            };
            let descendants = self.summarize_descendants(document, id);
            if !self.keep(document, id, &record, &descendants) {
                continue;
            }

            let index = fingerprints.len();
            let kind = classify_kind(&record.tag, &record.classes, &descendants);
            let text = self.extract_text(document, id, &record);
            let text_lower = text.to_lowercase();
            let ancestry = self.summarize_ancestry(document, id);
            let landmark = nearest_landmark(&ancestry);
            let group = group_for(kind, &record.tag);
            let importance =
                importance_for(&record.tag, &record.classes, kind, landmark.as_deref());
            let is_main_content = landmark.as_deref() == Some("main")
                || landmark.as_deref() == Some("hero")
                || ancestry.iter().any(|a| a.tag == "article");
            let is_interactive =
                matches!(kind, ElementKind::Button | ElementKind::Link) || record.editable;
            let visible =
                !record.hidden && record.bounds.2 > 0.0 && record.bounds.3 > 0.0;

            let locators = self.build_locators(document, id, &record);

            if is_landmark_node(&record) {
                sections.push(SectionNode {
                    name: landmark_name(&record),
                    locator: locators.trimmed.clone(),
                    headline: first_heading_text(document, id),
                    child_count: descendants.child_count,
                });
            }

            groups.push(group, index);
            fingerprints.push(ElementFingerprint {
                index,
                kind,
                text,
                text_lower,
                locators,
                editable: record.editable,
                removable: record.removable,
                bounds: record.bounds,
                visible,
                ancestry,
                landmark,
                descendants,
                role: SemanticRole {
                    group,
                    importance,
                    is_main_content,
                    is_interactive,
                },
                handle: NodeHandle {
                    node: id,
                    generation,
                },
            });
        }

        debug!(
            count = fingerprints.len(),
            generation, "scan complete"
        );
        PageInventory {
            fingerprints,
            groups,
            sections,
            generation,
        }
    }

    /// Keep rule: a reachable affordance, or a meaningful tag that carries
    /// text or is an image.
    fn keep(
        &self,
        document: &Document,
        id: NodeId,
        record: &NodeRecord,
        descendants: &DescendantSummary,
    ) -> bool {
        if record.editable || record.removable {
            return true;
        }
        if !MEANINGFUL_TAGS.contains(&record.tag.as_str()) {
            return false;
        }
        if record.tag == "img" || record.tag == "figure" {
            return true;
        }
        let own_text = record
            .text
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        own_text || (descendants.has_text && !document.deep_text(id).is_empty())
    }

    /// Text extraction with the stated precedence: nested heading, then
    /// paragraph, then actionable control, then raw text.
    fn extract_text(&self, document: &Document, id: NodeId, record: &NodeRecord) -> String {
        if HEADING_TAGS.contains(&record.tag.as_str()) {
            if let Some(text) = record.text.as_deref() {
                return self.truncate(text);
            }
        }
        let mut heading = None;
        let mut paragraph = None;
        let mut control = None;
        for child in document.descendants(id) {
            let Some(child_record) = document.node(child) else {
                continue;
            };
            let Some(text) = child_record.text.as_deref().map(str::trim) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            if heading.is_none() && HEADING_TAGS.contains(&child_record.tag.as_str()) {
                heading = Some(text.to_string());
            } else if paragraph.is_none() && child_record.tag == "p" {
                paragraph = Some(text.to_string());
            } else if control.is_none() && CONTROL_TAGS.contains(&child_record.tag.as_str()) {
                control = Some(text.to_string());
            }
        }
        let chosen = heading
            .or(paragraph)
            .or(control)
            .or_else(|| record.text.as_deref().map(|t| t.trim().to_string()))
            .unwrap_or_else(|| document.deep_text(id));
        self.truncate(&chosen)
    }

    fn truncate(&self, text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.chars().count() <= self.text_max {
            return trimmed.to_string();
        }
        let mut out: String = trimmed.chars().take(self.text_max).collect();
        out.push('…');
        out
    }

    fn summarize_ancestry(&self, document: &Document, id: NodeId) -> Vec<AncestorEntry> {
        let mut entries = Vec::new();
        let mut current = document.parent(id);
        while let Some(ancestor) = current {
            if entries.len() >= self.ancestry_depth {
                break;
            }
            if let Some(record) = document.node(ancestor) {
                entries.push(AncestorEntry {
                    tag: record.tag,
                    id: record.identifier,
                    classes: record.classes,
                });
            }
            current = document.parent(ancestor);
        }
        entries
    }

    fn summarize_descendants(&self, document: &Document, id: NodeId) -> DescendantSummary {
        let children = document.children(id);
        let descendants = document.descendants(id);
        let mut summary = DescendantSummary {
            child_count: children.len(),
            descendant_count: descendants.len(),
            ..Default::default()
        };
        for child in descendants {
            let Some(record) = document.node(child) else {
                continue;
            };
            if record
                .text
                .as_deref()
                .map(|t| !t.trim().is_empty())
                .unwrap_or(false)
            {
                summary.has_text = true;
            }
            if HEADING_TAGS.contains(&record.tag.as_str()) {
                summary.has_heading = true;
            }
            if record.tag == "img" || record.tag == "figure" {
                summary.has_image = true;
            }
            if CONTROL_TAGS.contains(&record.tag.as_str()) {
                summary.has_control = true;
            }
        }
        summary
    }

    fn build_locators(&self, document: &Document, id: NodeId, record: &NodeRecord) -> LocatorSet {
        // Identifier shortcut only when the id is actually unique; a
        // duplicated id would resolve to the wrong node later.
        let identifier = record
            .identifier
            .as_deref()
            .filter(|identifier| document.identifier_is_unique(identifier))
            .map(|identifier| identifier.to_string());
        LocatorSet {
            identifier,
            trimmed: document.trimmed_path(id, self.trimmed_segments),
            absolute: document.absolute_path(id),
        }
    }
}

fn nearest_landmark(ancestry: &[AncestorEntry]) -> Option<String> {
    for entry in ancestry {
        if LANDMARK_TAGS.contains(&entry.tag.as_str()) {
            return Some(entry.tag.clone());
        }
        if entry.classes.iter().any(|c| c.to_lowercase().contains("hero")) {
            return Some("hero".to_string());
        }
    }
    None
}

fn is_landmark_node(record: &NodeRecord) -> bool {
    LANDMARK_TAGS.contains(&record.tag.as_str())
        || (record.tag == "section"
            && record.classes.iter().any(|c| c.to_lowercase().contains("hero")))
}

fn landmark_name(record: &NodeRecord) -> String {
    if record.tag == "section" {
        "hero".to_string()
    } else {
        record.tag.clone()
    }
}

fn first_heading_text(document: &Document, id: NodeId) -> Option<String> {
    document.descendants(id).into_iter().find_map(|child| {
        let record = document.node(child)?;
        if HEADING_TAGS.contains(&record.tag.as_str()) {
            record.text.map(|t| t.trim().to_string())
        } else {
            None
        }
    })
}
