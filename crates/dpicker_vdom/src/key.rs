//! Unique element id generation
//!
//! Every widget needs ids for its input and its container that do not
//! collide with other widgets in the same document, even when many widgets
//! are created in a loop.
//!
//! # Example
//!
//! ```rust
//! use dpicker_vdom::key::InstanceId;
//!
//! let id = InstanceId::new("dpicker");
//! assert!(id.get().starts_with("dpicker-"));
//!
//! // Explicit ids for deterministic markup
//! let id = InstanceId::explicit("birthday");
//! assert_eq!(id.derive("container"), "birthday-container");
//! ```

use std::cell::OnceCell;

use uuid::Uuid;

/// Generate a fresh `{prefix}-{uuid}` id.
pub fn unique_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().as_simple())
}

/// Lazily generated unique id for an element.
///
/// Format: `{prefix}-{uuid}`. The id is generated on first access and
/// cached for the lifetime of the value.
pub struct InstanceId {
    id: OnceCell<String>,
    prefix: &'static str,
}

impl InstanceId {
    /// Id generated from `prefix` on first access
    pub fn new(prefix: &'static str) -> Self {
        Self {
            id: OnceCell::new(),
            prefix,
        }
    }

    /// Caller-provided id (for deterministic markup)
    pub fn explicit(id: impl Into<String>) -> Self {
        let instance = Self::new("");
        let _ = instance.id.set(id.into());
        instance
    }

    /// Get or generate the id.
    pub fn get(&self) -> &str {
        self.id.get_or_init(|| unique_id(self.prefix))
    }

    /// Id for a sub-element, e.g. `dpicker-1a2b...-container`
    pub fn derive(&self, suffix: &str) -> String {
        format!("{}-{}", self.get(), suffix)
    }

    /// Consume into the id string
    pub fn into_string(self) -> String {
        self.get();
        self.id.into_inner().unwrap_or_default()
    }
}

impl std::fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InstanceId({})", self.get())
    }
}

impl Clone for InstanceId {
    fn clone(&self) -> Self {
        // A clone names the same element
        Self::explicit(self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids_in_loop() {
        let ids: Vec<String> = (0..5).map(|_| unique_id("dpicker")).collect();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 5);
        assert!(ids.iter().all(|id| id.starts_with("dpicker-")));
    }

    #[test]
    fn test_explicit_id() {
        let id = InstanceId::explicit("birthday");
        assert_eq!(id.get(), "birthday");
        assert_eq!(id.derive("container"), "birthday-container");
    }

    #[test]
    fn test_id_stability() {
        let id = InstanceId::new("dpicker");
        let first = id.get().to_string();
        assert_eq!(id.get(), first);
        assert_eq!(id.clone().get(), first);
        assert_eq!(id.into_string(), first);
    }
}
