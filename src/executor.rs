//! Attempts a mutation through an ordered chain of locator strategies, then
//! re-scans and verifies that the mutation actually happened.
//!
//! The executor is a strict EXECUTE → settle → VERIFY machine. It never
//! rolls anything back: a strategy that partially applied before failing is
//! left as-is, and verification decides the outcome. A fingerprint whose
//! generation no longer matches the live document is re-resolved through a
//! fresh scan before anything is mutated.

use crate::backend::AutomationBackend;
use crate::dom::Document;
use crate::errors::AutomationError;
use crate::fingerprint::{ElementFingerprint, LocatorStrategy};
use crate::intent::{Action, Intent};
use crate::scanner::PageScanner;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// One of three descending-confidence checks that decide whether a mutation
/// took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceTier {
    /// The target's locator now carries the expected state.
    Locator,
    /// Some fingerprint of the same kind carries exactly the expected value.
    TypeWide,
    /// Weak circumstantial evidence (old text gone / lingering after remove).
    Circumstantial,
}

/// Successful execution report: which strategy landed and which evidence
/// tier confirmed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verified {
    pub strategy: LocatorStrategy,
    pub tier: EvidenceTier,
}

#[derive(Debug, Clone)]
pub struct ActionExecutor {
    scanner: PageScanner,
    /// Bounded wait after a mutation so the host's own update cycle can
    /// finish before re-scanning.
    settle: Duration,
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self {
            scanner: PageScanner::default(),
            settle: Duration::from_millis(150),
        }
    }
}

impl ActionExecutor {
    pub fn new(scanner: PageScanner, settle: Duration) -> Self {
        Self { scanner, settle }
    }

    /// Runs the mutation for a resolved target and verifies it.
    ///
    /// Errors are limited to [`AutomationError::LocatorExhausted`] (every
    /// strategy raised, or the target vanished before execution) and
    /// [`AutomationError::VerificationFailed`]; both are meant to be caught
    /// once at the orchestrator boundary.
    #[instrument(level = "debug", skip_all, fields(action = ?intent.action, target = target.index))]
    pub async fn execute(
        &self,
        backend: &dyn AutomationBackend,
        document: &Document,
        intent: &Intent,
        target: &ElementFingerprint,
    ) -> Result<Verified, AutomationError> {
        let target = self.refresh_if_stale(document, target)?;

        let new_text = match intent.action {
            Action::Edit => Some(intent.new_text.as_deref().ok_or_else(|| {
                AutomationError::UnsupportedOperation(
                    "edit intent carries no replacement text".to_string(),
                )
            })?),
            Action::Remove => None,
            Action::Add | Action::Unknown => {
                return Err(AutomationError::UnsupportedOperation(format!(
                    "executor only handles edit/remove, got {:?}",
                    intent.action
                )))
            }
        };

        let strategy = self.try_strategies(backend, &target, new_text)?;

        // Settle interval: let the host's rendering cycle catch up before we
        // look for evidence.
        tokio::time::sleep(self.settle).await;

        let fresh = self.scanner.scan(Some(document));
        let tier = match intent.action {
            Action::Edit => self.verify_edit(&fresh, &target, new_text.unwrap_or_default())?,
            _ => self.verify_remove(&fresh, &target),
        };
        debug!(?strategy, ?tier, "mutation verified");
        Ok(Verified { strategy, tier })
    }

    /// Generation check: a handle captured before the last mutation must not
    /// be trusted. Re-scan and re-resolve by trimmed locator, then by exact
    /// text; a target that vanished entirely is locator exhaustion, not a
    /// crash.
    fn refresh_if_stale(
        &self,
        document: &Document,
        target: &ElementFingerprint,
    ) -> Result<ElementFingerprint, AutomationError> {
        if target.handle.generation == document.generation() {
            return Ok(target.clone());
        }
        warn!(
            captured = target.handle.generation,
            current = document.generation(),
            "fingerprint is stale; re-resolving before mutation"
        );
        let fresh = self.scanner.scan(Some(document));
        fresh
            .fingerprints
            .iter()
            .find(|fp| fp.locators.trimmed == target.locators.trimmed)
            .or_else(|| {
                fresh
                    .fingerprints
                    .iter()
                    .find(|fp| !fp.text_lower.is_empty() && fp.text_lower == target.text_lower)
            })
            .cloned()
            .ok_or_else(|| {
                AutomationError::LocatorExhausted(format!(
                    "target '{}' vanished between scan and execute",
                    target.text
                ))
            })
    }

    /// The ordered, short-circuiting strategy loop with typed failure
    /// accumulation: identifier, trimmed path, absolute path, literal text.
    fn try_strategies(
        &self,
        backend: &dyn AutomationBackend,
        target: &ElementFingerprint,
        new_text: Option<&str>,
    ) -> Result<LocatorStrategy, AutomationError> {
        let mut strategies = target.locators.strategies();
        if !target.text.is_empty() {
            strategies.push((LocatorStrategy::Text, format!("text:{}", target.text)));
        }

        let mut failures: Vec<String> = Vec::new();
        for (strategy, locator) in strategies {
            let attempt = match new_text {
                Some(value) => backend.change_text(&locator, value),
                None => backend.remove_element(&locator),
            };
            match attempt {
                Ok(()) => {
                    debug!(%strategy, locator, "mutation applied");
                    return Ok(strategy);
                }
                Err(err) => {
                    debug!(%strategy, locator, %err, "strategy failed");
                    failures.push(format!("{strategy}: {err}"));
                }
            }
        }
        Err(AutomationError::LocatorExhausted(failures.join("; ")))
    }

    /// Three descending-confidence tiers for edits; the first to succeed
    /// decides the evidence level.
    fn verify_edit(
        &self,
        fresh: &crate::fingerprint::PageInventory,
        target: &ElementFingerprint,
        expected: &str,
    ) -> Result<EvidenceTier, AutomationError> {
        let expected_lower = expected.trim().to_lowercase();

        // Tier A: same locator (or its structural equivalent) now carries
        // the expected value.
        let tier_a = fresh.fingerprints.iter().any(|fp| {
            (fp.locators.trimmed == target.locators.trimmed
                || fp.locators.absolute == target.locators.absolute)
                && fp.text_lower.contains(&expected_lower)
        });
        if tier_a {
            return Ok(EvidenceTier::Locator);
        }

        // Tier B: any fingerprint of the same kind holds exactly the value;
        // covers locator churn from intervening DOM mutations.
        let tier_b = fresh
            .fingerprints
            .iter()
            .any(|fp| fp.kind == target.kind && fp.text_lower == expected_lower);
        if tier_b {
            return Ok(EvidenceTier::TypeWide);
        }

        // Tier C: the pre-mutation text is gone everywhere.
        let old_text = &target.text_lower;
        if !old_text.is_empty()
            && !fresh
                .fingerprints
                .iter()
                .any(|fp| fp.text_lower.contains(old_text.as_str()))
        {
            return Ok(EvidenceTier::Circumstantial);
        }

        Err(AutomationError::VerificationFailed(format!(
            "no evidence for edit: locator '{}' does not contain '{}', no {} holds it, and old text '{}' still present",
            target.locators.trimmed, expected, target.kind, target.text
        )))
    }

    /// Removal is verified by absence. A lingering match is logged but does
    /// not flip the result, since rendering can legitimately lag.
    fn verify_remove(
        &self,
        fresh: &crate::fingerprint::PageInventory,
        target: &ElementFingerprint,
    ) -> EvidenceTier {
        let locator_gone = !fresh.fingerprints.iter().any(|fp| {
            fp.locators.trimmed == target.locators.trimmed
                || fp.locators.absolute == target.locators.absolute
        });
        if locator_gone {
            return EvidenceTier::Locator;
        }
        let text_gone = target.text_lower.is_empty()
            || !fresh
                .fingerprints
                .iter()
                .any(|fp| fp.text_lower == target.text_lower);
        if text_gone {
            return EvidenceTier::TypeWide;
        }
        warn!(
            locator = %target.locators.trimmed,
            text = %target.text,
            "target still present after removal; rendering may be lagging"
        );
        EvidenceTier::Circumstantial
    }
}
