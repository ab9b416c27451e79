//! Tests for the shared document tree: generations, paths, locator grammar.

use super::demo_page;
use crate::dom::{Document, NodeRecord};

#[test]
fn generation_bumps_on_every_mutation() {
    let doc = Document::new();
    let root = doc.root();
    assert_eq!(doc.generation(), 0);

    let p = doc
        .append(root, NodeRecord::new("p").with_text("hello"))
        .unwrap();
    assert_eq!(doc.generation(), 1);

    doc.set_text(p, "world").unwrap();
    assert_eq!(doc.generation(), 2);

    doc.remove(p).unwrap();
    assert_eq!(doc.generation(), 3);
}

#[test]
fn removed_subtree_is_detached_everywhere() {
    let page = demo_page();
    let doc = &page.doc;

    doc.remove(page.card).unwrap();

    assert!(doc.node(page.card).is_none());
    assert!(doc.walk().iter().all(|id| *id != page.card));
    // The hero button's copy of the label is still reachable.
    assert_eq!(
        doc.resolve_locator("text:Learn More"),
        Some(page.learn_more_button)
    );
}

#[test]
fn removing_the_root_is_rejected() {
    let doc = Document::new();
    assert!(doc.remove(doc.root()).is_err());
}

#[test]
fn absolute_path_uses_same_tag_sibling_indices() {
    let page = demo_page();
    let path = page.doc.absolute_path(page.hero_title);
    // The hero section is the first <section> child of body even though the
    // header precedes it.
    assert_eq!(path, "/body[0]/section[0]/h1[0]");
}

#[test]
fn locator_grammars_resolve_to_the_same_node() {
    let page = demo_page();
    let doc = &page.doc;

    assert_eq!(doc.resolve_locator("#hero-title"), Some(page.hero_title));
    assert_eq!(
        doc.resolve_locator("/body[0]/section[0]/h1[0]"),
        Some(page.hero_title)
    );
    assert_eq!(
        doc.resolve_locator("section[0]/h1[0]"),
        Some(page.hero_title)
    );
    assert_eq!(doc.resolve_locator("text:Old Title"), Some(page.hero_title));
}

#[test]
fn unknown_locators_resolve_to_none() {
    let page = demo_page();
    let doc = &page.doc;

    assert_eq!(doc.resolve_locator("#nope"), None);
    assert_eq!(doc.resolve_locator("/body[0]/table[4]"), None);
    assert_eq!(doc.resolve_locator("text:not on this page"), None);
    assert_eq!(doc.resolve_locator(""), None);
}

#[test]
fn trimmed_path_matches_by_suffix_in_document_order() {
    let doc = Document::new();
    let root = doc.root();
    let first = doc.append(root, NodeRecord::new("section")).unwrap();
    let second = doc.append(root, NodeRecord::new("section")).unwrap();
    let p_first = doc
        .append(first, NodeRecord::new("p").with_text("one"))
        .unwrap();
    doc.append(second, NodeRecord::new("p").with_text("two"))
        .unwrap();

    // `p[0]` alone is ambiguous; the earliest match in document order wins.
    assert_eq!(doc.resolve_locator("p[0]"), Some(p_first));
    assert_eq!(doc.resolve_locator("section[1]/p[0]"), doc.children(second).first().copied());
}
