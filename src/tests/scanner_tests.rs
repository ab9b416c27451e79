//! Tests for the page scanner: keep rule, classification, determinism.

use super::{demo_page, init_tracing};
use crate::dom::{Document, NodeRecord};
use crate::fingerprint::{ElementKind, RoleGroup};
use crate::scanner::PageScanner;

#[test]
fn absent_surface_yields_empty_inventory() {
    let inventory = PageScanner::default().scan(None);
    assert!(inventory.is_empty());
    assert_eq!(inventory.generation, 0);
}

#[test]
fn scanning_twice_without_mutation_is_deterministic() {
    init_tracing();
    let page = demo_page();
    let scanner = PageScanner::default();

    let first = scanner.scan(Some(&page.doc));
    let second = scanner.scan(Some(&page.doc));

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn hero_headline_fingerprint_is_fully_populated() {
    let page = demo_page();
    let inventory = PageScanner::default().scan(Some(&page.doc));

    let headline = inventory
        .fingerprints
        .iter()
        .find(|fp| fp.kind == ElementKind::Headline && fp.text == "Old Title")
        .expect("hero headline fingerprinted");

    assert_eq!(headline.kind, ElementKind::Headline);
    assert!(headline.editable);
    assert!(!headline.removable);
    assert!(headline.visible);
    assert_eq!(headline.locators.identifier.as_deref(), Some("hero-title"));
    assert_eq!(headline.locators.absolute, "/body[0]/section[0]/h1[0]");
    assert_eq!(headline.landmark.as_deref(), Some("hero"));
    assert_eq!(headline.role.group, RoleGroup::Headlines);
    assert_eq!(headline.role.importance, 7);
    assert!(headline.role.is_main_content);
    assert_eq!(headline.handle.generation, page.doc.generation());
}

#[test]
fn inert_nodes_without_affordances_or_meaningful_tags_are_skipped() {
    let doc = Document::new();
    let root = doc.root();
    doc.append(root, NodeRecord::new("div").with_text("just a wrapper"))
        .unwrap();
    doc.append(root, NodeRecord::new("span").with_text("loose label"))
        .unwrap();
    doc.append(root, NodeRecord::new("p").with_text("kept paragraph"))
        .unwrap();

    let inventory = PageScanner::default().scan(Some(&doc));
    let texts: Vec<&str> = inventory
        .fingerprints
        .iter()
        .map(|fp| fp.text.as_str())
        .collect();

    assert!(texts.contains(&"kept paragraph"));
    assert!(!texts.contains(&"just a wrapper"));
    assert!(!texts.contains(&"loose label"));
}

#[test]
fn affordance_alone_keeps_a_generic_container() {
    let page = demo_page();
    let inventory = PageScanner::default().scan(Some(&page.doc));

    let card = inventory
        .fingerprints
        .iter()
        .find(|fp| fp.kind == ElementKind::Container)
        .expect("removable card fingerprinted");
    assert_eq!(card.text, "Learn More");
    assert!(card.removable);
    assert_eq!(card.role.group, RoleGroup::Other);
}

#[test]
fn long_text_is_truncated_with_an_ellipsis() {
    let doc = Document::new();
    let long = "word ".repeat(40);
    doc.append(doc.root(), NodeRecord::new("p").with_text(long))
        .unwrap();

    let inventory = PageScanner::default().scan(Some(&doc));
    let fp = &inventory.fingerprints[0];
    assert!(fp.text.ends_with('…'));
    assert_eq!(fp.text.chars().count(), 81);
}

#[test]
fn hidden_or_zero_sized_nodes_are_kept_but_not_visible() {
    let doc = Document::new();
    let root = doc.root();
    doc.append(root, NodeRecord::new("p").with_text("ghost").hidden(true))
        .unwrap();
    doc.append(
        root,
        NodeRecord::new("p")
            .with_text("flat")
            .with_bounds((0.0, 0.0, 0.0, 0.0)),
    )
    .unwrap();

    let inventory = PageScanner::default().scan(Some(&doc));
    assert_eq!(inventory.len(), 2);
    assert!(inventory.fingerprints.iter().all(|fp| !fp.visible));
}

#[test]
fn section_text_prefers_the_nested_heading() {
    let page = demo_page();
    let inventory = PageScanner::default().scan(Some(&page.doc));

    let hero = inventory
        .fingerprints
        .iter()
        .find(|fp| fp.landmark.is_none() && fp.kind == ElementKind::Section && fp.text == "Old Title");
    assert!(hero.is_some(), "hero section labels itself by its headline");
}

#[test]
fn landmark_section_tree_lists_the_hero() {
    let page = demo_page();
    let inventory = PageScanner::default().scan(Some(&page.doc));

    let hero = inventory
        .sections
        .iter()
        .find(|s| s.name == "hero")
        .expect("hero landmark in structure tree");
    assert_eq!(hero.headline.as_deref(), Some("Old Title"));

    let names: Vec<&str> = inventory.sections.iter().map(|s| s.name.as_str()).collect();
    assert!(names.contains(&"header"));
    assert!(names.contains(&"main"));
    assert!(names.contains(&"footer"));
}

#[test]
fn role_groups_index_matches_document_order() {
    let page = demo_page();
    let inventory = PageScanner::default().scan(Some(&page.doc));

    let headlines = inventory.by_group(RoleGroup::Headlines);
    assert_eq!(headlines.len(), 2);
    assert_eq!(headlines[0].text, "Old Title");
    assert_eq!(headlines[1].text, "Features");

    let buttons = inventory.by_group(RoleGroup::Buttons);
    assert!(buttons.iter().any(|fp| fp.text == "Learn More"));
}
