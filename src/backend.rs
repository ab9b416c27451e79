//! The two external collaborator seams: surface resolution and the opaque
//! mutation primitives.
//!
//! The core never searches for a surface itself and never inspects the
//! automation engine's internals; both sides are traits so hosts and tests
//! can substitute their own.

use crate::dom::Document;
use crate::errors::AutomationError;
use tracing::debug;

/// Supplies the document handle the scanner operates on, or nothing when no
/// editable surface is available (a normal outcome, not an error).
pub trait SurfaceProvider: Send + Sync {
    fn resolve_surface(&self) -> Option<Document>;
}

/// A provider pinned to one document, the common case for hosts that own
/// their surface.
#[derive(Debug, Clone)]
pub struct FixedSurface {
    document: Document,
}

impl FixedSurface {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl SurfaceProvider for FixedSurface {
    fn resolve_surface(&self) -> Option<Document> {
        Some(self.document.clone())
    }
}

/// A provider with no surface at all; every command reports the missing
/// target document.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSurface;

impl SurfaceProvider for NoSurface {
    fn resolve_surface(&self) -> Option<Document> {
        None
    }
}

/// Opaque, possibly-failing mutation primitives. The executor feeds these
/// locator strings from its fallback chain and treats any error as "this
/// strategy raised".
pub trait AutomationBackend: Send + Sync {
    fn change_text(&self, locator: &str, new_value: &str) -> Result<(), AutomationError>;
    fn remove_element(&self, locator: &str) -> Result<(), AutomationError>;
}

/// The in-crate backend: resolves locators against a [`Document`] and
/// applies the mutation directly.
#[derive(Debug, Clone)]
pub struct DomBackend {
    document: Document,
}

impl DomBackend {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl AutomationBackend for DomBackend {
    fn change_text(&self, locator: &str, new_value: &str) -> Result<(), AutomationError> {
        let id = self.document.resolve_locator(locator).ok_or_else(|| {
            AutomationError::ElementNotFound(format!("no node for locator '{locator}'"))
        })?;
        debug!(locator, new_value, "change_text");
        self.document.set_text(id, new_value)
    }

    fn remove_element(&self, locator: &str) -> Result<(), AutomationError> {
        let id = self.document.resolve_locator(locator).ok_or_else(|| {
            AutomationError::ElementNotFound(format!("no node for locator '{locator}'"))
        })?;
        debug!(locator, "remove_element");
        self.document.remove(id)
    }
}
