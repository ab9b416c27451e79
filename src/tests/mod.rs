mod dom_tests;
mod scanner_tests;
mod scorer_tests;

use crate::dom::{Document, NodeId, NodeRecord};

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init();
}

/// A small marketing page every suite can scan and mutate: header with nav
/// links, a hero section with an editable headline, a features section, an
/// inert card sharing its label with a real button, and a footer.
pub struct DemoPage {
    pub doc: Document,
    pub hero_title: NodeId,
    pub hero_copy: NodeId,
    pub learn_more_button: NodeId,
    pub features_copy: NodeId,
    pub card: NodeId,
}

pub fn demo_page() -> DemoPage {
    let doc = Document::new();
    let root = doc.root();

    let header = doc.append(root, NodeRecord::new("header")).unwrap();
    let nav = doc.append(header, NodeRecord::new("nav")).unwrap();
    doc.append(nav, NodeRecord::new("a").with_text("Home"))
        .unwrap();
    doc.append(nav, NodeRecord::new("a").with_text("Pricing"))
        .unwrap();

    let hero = doc
        .append(root, NodeRecord::new("section").with_classes(&["hero"]))
        .unwrap();
    let hero_title = doc
        .append(
            hero,
            NodeRecord::new("h1")
                .with_id("hero-title")
                .with_text("Old Title")
                .editable(true),
        )
        .unwrap();
    let hero_copy = doc
        .append(
            hero,
            NodeRecord::new("p")
                .with_text("Ship faster with less busywork.")
                .editable(true),
        )
        .unwrap();
    let learn_more_button = doc
        .append(
            hero,
            NodeRecord::new("button")
                .with_classes(&["btn"])
                .with_text("Learn More")
                .removable(true),
        )
        .unwrap();

    let main = doc.append(root, NodeRecord::new("main")).unwrap();
    let features = doc.append(main, NodeRecord::new("section")).unwrap();
    doc.append(
        features,
        NodeRecord::new("h2").with_text("Features").editable(true),
    )
    .unwrap();
    let features_copy = doc
        .append(
            features,
            NodeRecord::new("p")
                .with_text("Everything you need to launch.")
                .editable(true)
                .removable(true),
        )
        .unwrap();

    // An inert card whose label collides with the hero button; it is only
    // fingerprinted because the host exposes a delete affordance for it.
    let card = doc
        .append(main, NodeRecord::new("div").with_classes(&["card"]).removable(true))
        .unwrap();
    doc.append(card, NodeRecord::new("span").with_text("Learn More"))
        .unwrap();

    let footer = doc.append(root, NodeRecord::new("footer")).unwrap();
    doc.append(footer, NodeRecord::new("p").with_text("© 2026 Acme Inc."))
        .unwrap();

    DemoPage {
        doc,
        hero_title,
        hero_copy,
        learn_more_button,
        features_copy,
        card,
    }
}
