//! Tests for candidate scoring: dominance, gating, filters, tie-breaks.

use super::demo_page;
use crate::dom::{Document, NodeRecord};
use crate::fingerprint::ElementKind;
use crate::intent::{Action, Intent, IntentClassifier};
use crate::scanner::PageScanner;
use crate::scorer::{CandidateScorer, ScoringWeights};

fn intent(action: Action) -> Intent {
    Intent {
        action,
        target_type: None,
        target_text: None,
        new_text: None,
        position: None,
        landmark: None,
        confidence: 1,
    }
}

#[test]
fn scoring_identical_inputs_is_pure() {
    let page = demo_page();
    let inventory = PageScanner::default().scan(Some(&page.doc));
    let scorer = CandidateScorer::default();
    let intent = IntentClassifier::default().classify("change the headline to read: X");

    let first = scorer.score(&inventory, &intent);
    let second = scorer.score(&inventory, &intent);

    let flatten = |ranked: &[crate::scorer::ScoredCandidate]| {
        ranked
            .iter()
            .map(|c| (c.fingerprint.index, c.score))
            .collect::<Vec<_>>()
    };
    assert_eq!(flatten(&first), flatten(&second));
}

#[test]
fn exact_editable_text_match_dominates() {
    let page = demo_page();
    let inventory = PageScanner::default().scan(Some(&page.doc));
    let scorer = CandidateScorer::default();

    let mut query = intent(Action::Edit);
    query.target_text = Some("Old Title".to_string());
    query.new_text = Some("New Title".to_string());

    let ranked = scorer.score(&inventory, &query);
    assert_eq!(ranked[0].fingerprint.text, "Old Title");
    assert_eq!(ranked[0].fingerprint.kind, ElementKind::Headline);
    assert!(ranked[0].reasons.iter().any(|r| r == "exact text match"));
    assert!(ranked[0].score > ranked[1].score);
}

#[test]
fn type_filter_keeps_inert_twins_out_of_the_running() {
    let page = demo_page();
    let inventory = PageScanner::default().scan(Some(&page.doc));
    let scorer = CandidateScorer::default();

    // Both the real button and the inert card carry "Learn More".
    let mut query = intent(Action::Remove);
    query.target_type = Some("button".to_string());
    query.target_text = Some("Learn More".to_string());

    let resolved = scorer.resolve(&inventory, &query).expect("button resolved");
    assert_eq!(resolved.kind, ElementKind::Button);
    assert!(resolved.removable);

    let ranked = scorer.score(&inventory, &query);
    assert!(ranked
        .iter()
        .all(|c| c.fingerprint.kind != ElementKind::Container));
}

#[test]
fn below_gate_resolves_to_none_instead_of_guessing() {
    let page = demo_page();
    let inventory = PageScanner::default().scan(Some(&page.doc));
    let scorer = CandidateScorer::default();

    let mut query = intent(Action::Remove);
    query.target_text = Some("quantum flux capacitor".to_string());

    assert!(scorer.resolve(&inventory, &query).is_none());
}

#[test]
fn gate_boundary_is_inclusive() {
    let page = demo_page();
    let inventory = PageScanner::default().scan(Some(&page.doc));

    let exact_only = |min_score: i64| ScoringWeights {
        exact_text: 20,
        partial_text: 0,
        fuzzy_text: 0,
        kind_exact: 0,
        kind_partial: 0,
        role_alignment: 0,
        position: 0,
        editable_bonus: 0,
        visible: 0,
        importance_scale: 0,
        landmark: 0,
        min_score,
    };

    let mut query = intent(Action::Remove);
    query.target_text = Some("Learn More".to_string());

    // Exactly at the gate: accepted.
    let at_gate = CandidateScorer::new(exact_only(20));
    assert!(at_gate.resolve(&inventory, &query).is_some());

    // One point above the only contribution: rejected.
    let above_gate = CandidateScorer::new(exact_only(21));
    assert!(above_gate.resolve(&inventory, &query).is_none());
}

#[test]
fn equal_scores_resolve_to_the_earliest_index() {
    let doc = Document::new();
    let root = doc.root();
    for text in ["alpha copy", "beta copy"] {
        doc.append(root, NodeRecord::new("p").with_text(text).editable(true))
            .unwrap();
    }
    let inventory = PageScanner::default().scan(Some(&doc));
    let scorer = CandidateScorer::default();

    let mut query = intent(Action::Edit);
    query.target_type = Some("paragraph".to_string());
    query.new_text = Some("replaced".to_string());

    let resolved = scorer.resolve(&inventory, &query).expect("resolved");
    assert_eq!(resolved.text, "alpha copy");
    assert_eq!(resolved.index, inventory.fingerprints[0].index);
}

#[test]
fn edit_prefers_an_editable_twin_over_a_higher_scoring_inert_match() {
    let doc = Document::new();
    let root = doc.root();
    // The inert h1 outscores the hidden editable h6 on raw factors.
    doc.append(root, NodeRecord::new("h1").with_text("Promo"))
        .unwrap();
    doc.append(
        root,
        NodeRecord::new("h6").with_text("Promo").editable(true).hidden(true),
    )
    .unwrap();

    let inventory = PageScanner::default().scan(Some(&doc));
    let scorer = CandidateScorer::default();

    let mut query = intent(Action::Edit);
    query.target_type = Some("headline".to_string());
    query.target_text = Some("Promo".to_string());
    query.new_text = Some("Sale".to_string());

    let ranked = scorer.score(&inventory, &query);
    assert!(ranked[0].fingerprint.editable, "editable twin wins the pass");
    assert!(ranked
        .iter()
        .any(|c| c.reasons.iter().any(|r| r.contains("score halved"))));
}

#[test]
fn add_intents_never_search_for_candidates() {
    let page = demo_page();
    let inventory = PageScanner::default().scan(Some(&page.doc));
    let scorer = CandidateScorer::default();

    let query = IntentClassifier::default().classify("add a pricing table");
    assert_eq!(query.action, Action::Add);
    assert!(scorer.resolve(&inventory, &query).is_none());

    // Even against an empty inventory the contract is the same.
    let empty = PageScanner::default().scan(None);
    assert!(scorer.resolve(&empty, &query).is_none());
}

#[test]
fn position_literal_biases_toward_the_matching_ordinal() {
    let doc = Document::new();
    let root = doc.root();
    for text in ["one", "two", "three"] {
        doc.append(root, NodeRecord::new("p").with_text(text).editable(true))
            .unwrap();
    }
    let inventory = PageScanner::default().scan(Some(&doc));
    let scorer = CandidateScorer::default();

    let mut query = intent(Action::Edit);
    query.target_type = Some("paragraph".to_string());
    query.new_text = Some("x".to_string());
    query.position = Some(crate::intent::Position::Last);

    let resolved = scorer.resolve(&inventory, &query).expect("resolved");
    assert_eq!(resolved.text, "three");
}
