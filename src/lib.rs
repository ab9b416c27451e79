//! Free-text command automation against a live document tree.
//!
//! This crate resolves an instruction like "make the headline read: Welcome
//! Aboard" to one specific node of an externally-mutable document, mutates
//! it through a fallback chain of locator strategies, and verifies that the
//! mutation actually happened, using deterministic heuristics throughout.
//!
//! The pipeline runs one command at a time: Scan → Classify → Score →
//! Execute → Verify, producing one [`ActionResult`] per command. The engine
//! is not reentrant-safe: two overlapping invocations against the same
//! document can race, and correctness comes from verifying after every
//! mutation rather than assuming anything before it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub mod backend;
pub mod dom;
pub mod errors;
pub mod executor;
pub mod fingerprint;
pub mod intent;
pub mod scanner;
pub mod scorer;
#[cfg(test)]
mod tests;

pub use backend::{AutomationBackend, DomBackend, FixedSurface, NoSurface, SurfaceProvider};
pub use dom::{Document, NodeId, NodeRecord};
pub use errors::AutomationError;
pub use executor::{ActionExecutor, EvidenceTier, Verified};
pub use fingerprint::{ElementFingerprint, ElementKind, PageInventory, RoleGroup};
pub use intent::{Action, Intent, IntentClassifier, Thesaurus};
pub use scanner::PageScanner;
pub use scorer::{CandidateScorer, ScoredCandidate, ScoringWeights};

/// Expected (non-exceptional) and executor-level failure classes surfaced
/// through [`ActionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The surface collaborator returned nothing; expected, not exceptional.
    NoTargetDocument,
    /// Best score fell below the acceptance gate; expected.
    NoCandidates,
    /// The command classified to no action (confidence 0); expected.
    AmbiguousIntent,
    /// Every locator strategy raised.
    LocatorExhausted,
    /// The mutation ran but no evidence tier confirmed it.
    VerificationFailed,
}

/// Terminal value returned to the caller, one per processed command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub evidence: Option<EvidenceTier>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure: Option<FailureKind>,
}

impl ActionResult {
    fn succeeded(message: String, evidence: EvidenceTier) -> Self {
        Self {
            success: true,
            message,
            evidence: Some(evidence),
            failure: None,
        }
    }

    fn failed(kind: FailureKind, message: String) -> Self {
        Self {
            success: false,
            message,
            evidence: None,
            failure: Some(kind),
        }
    }

    fn delegated(message: String) -> Self {
        Self {
            success: false,
            message,
            evidence: None,
            failure: None,
        }
    }
}

/// Tunables for an engine instance; every table is explicit so parallel
/// engines stay isolated and tests can substitute fixtures.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub scanner: PageScanner,
    pub weights: ScoringWeights,
    pub thesaurus: Thesaurus,
    pub settle: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            scanner: PageScanner::default(),
            weights: ScoringWeights::default(),
            thesaurus: Thesaurus::default(),
            settle: Duration::from_millis(150),
        }
    }
}

/// The main entry point: a thin orchestrator over scanner, classifier,
/// scorer and executor.
pub struct Engine {
    surface: Arc<dyn SurfaceProvider>,
    backend: Arc<dyn AutomationBackend>,
    scanner: PageScanner,
    classifier: IntentClassifier,
    scorer: CandidateScorer,
    executor: ActionExecutor,
}

impl Engine {
    pub fn new(surface: Arc<dyn SurfaceProvider>, backend: Arc<dyn AutomationBackend>) -> Self {
        Self::with_options(surface, backend, EngineOptions::default())
    }

    pub fn with_options(
        surface: Arc<dyn SurfaceProvider>,
        backend: Arc<dyn AutomationBackend>,
        options: EngineOptions,
    ) -> Self {
        Self {
            surface,
            backend,
            scanner: options.scanner.clone(),
            classifier: IntentClassifier::new(options.thesaurus, intent::default_keywords()),
            scorer: CandidateScorer::new(options.weights),
            executor: ActionExecutor::new(options.scanner, options.settle),
        }
    }

    /// Convenience constructor for a self-contained engine over one
    /// document, with the in-crate backend wired up.
    pub fn over_document(document: Document) -> Self {
        Self::new(
            Arc::new(FixedSurface::new(document.clone())),
            Arc::new(DomBackend::new(document)),
        )
    }

    /// Snapshots the current surface. Empty inventory when no surface is
    /// available.
    #[instrument(level = "debug", skip(self))]
    pub fn scan(&self) -> PageInventory {
        self.scanner.scan(self.surface.resolve_surface().as_ref())
    }

    /// Classifies a command without running it.
    pub fn classify(&self, command: &str) -> Intent {
        self.classifier.classify(command)
    }

    /// Processes one command end to end and reports a single result.
    ///
    /// Expected outcomes (missing surface, no candidate, unclassifiable
    /// command) come back as structured failures so callers can re-prompt;
    /// executor errors are caught here, rendered into the message, and never
    /// retried automatically.
    #[instrument(level = "debug", skip(self))]
    pub async fn process(&self, command: &str) -> ActionResult {
        let Some(document) = self.surface.resolve_surface() else {
            return ActionResult::failed(
                FailureKind::NoTargetDocument,
                "No editable surface is available right now.".to_string(),
            );
        };

        let inventory = self.scanner.scan(Some(&document));
        let intent = self.classifier.classify(command);
        debug!(
            action = ?intent.action,
            confidence = intent.confidence,
            inventory = inventory.len(),
            "pipeline input ready"
        );

        match intent.action {
            Action::Unknown => ActionResult::failed(
                FailureKind::AmbiguousIntent,
                "I couldn't tell whether you want to add, edit or remove something. \
                 Try a verb like 'change' or 'remove'."
                    .to_string(),
            ),
            Action::Add => ActionResult::delegated(format!(
                "Creating new content ({}) is delegated to the host; this engine only \
                 edits or removes existing elements.",
                intent.target_type.as_deref().unwrap_or("element")
            )),
            Action::Edit if intent.new_text.is_none() => ActionResult::failed(
                FailureKind::AmbiguousIntent,
                "I can see this is an edit, but not what the new text should be. \
                 Try '... to read: <new text>'."
                    .to_string(),
            ),
            Action::Edit | Action::Remove => {
                let Some(target) = self.scorer.resolve(&inventory, &intent) else {
                    return ActionResult::failed(
                        FailureKind::NoCandidates,
                        "Nothing on the page matched that description closely enough. \
                         Can you describe the element differently?"
                            .to_string(),
                    );
                };
                match self
                    .executor
                    .execute(self.backend.as_ref(), &document, &intent, &target)
                    .await
                {
                    Ok(verified) => ActionResult::succeeded(
                        format!(
                            "{} '{}' via {} locator (evidence tier: {:?}).",
                            if intent.action == Action::Edit {
                                "Updated"
                            } else {
                                "Removed"
                            },
                            target.text,
                            verified.strategy,
                            verified.tier
                        ),
                        verified.tier,
                    ),
                    Err(err) => {
                        warn!(%err, "executor failed");
                        let kind = match &err {
                            AutomationError::VerificationFailed(_) => {
                                FailureKind::VerificationFailed
                            }
                            _ => FailureKind::LocatorExhausted,
                        };
                        ActionResult::failed(kind, err.to_string())
                    }
                }
            }
        }
    }
}
