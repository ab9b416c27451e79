//! Builds a small landing page in memory and drives it with free-text
//! commands. Run with `cargo run --example edit_headline`.

use anyhow::Result;
use pagewright::{Document, Engine, NodeRecord};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let doc = Document::new();
    let body = doc.root();

    let hero = doc.append(
        body,
        NodeRecord::new("section").with_classes(&["hero"]),
    )?;
    doc.append(
        hero,
        NodeRecord::new("h1")
            .with_id("hero-title")
            .with_text("Old Title")
            .editable(true),
    )?;
    doc.append(
        hero,
        NodeRecord::new("p")
            .with_text("Ship faster with less busywork.")
            .editable(true),
    )?;
    doc.append(
        hero,
        NodeRecord::new("button")
            .with_text("Learn More")
            .removable(true),
    )?;

    let engine = Engine::over_document(doc);

    for command in [
        "make the headline read: Welcome Aboard",
        "remove the button that says 'Learn More'",
        "add a pricing table",
        "do something nice",
    ] {
        let result = engine.process(command).await;
        println!("> {command}");
        println!("{}\n", serde_json::to_string_pretty(&result)?);
    }

    let inventory = engine.scan();
    println!("final page ({} elements):", inventory.len());
    for fp in &inventory.fingerprints {
        println!("  [{}] {} \"{}\"", fp.index, fp.kind, fp.text);
    }

    Ok(())
}
