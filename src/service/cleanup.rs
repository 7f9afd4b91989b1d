//! Anonymous identity cleanup guard
//!
//! When a user signs in after using the app anonymously, the anonymous
//! identity's tasks are deleted once. The registry remembers which
//! (previous, current) transitions were already handled so that observing
//! the same transition again does not fire a second deletion.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub anonymous: bool,
}

impl Identity {
    pub fn anonymous(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            anonymous: true,
        }
    }

    pub fn authenticated(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            anonymous: false,
        }
    }
}

/// One observed change of the signed-in identity
#[derive(Debug, Clone, Copy)]
pub struct IdentityTransition<'a> {
    pub previous: &'a Identity,
    pub current: &'a Identity,
}

impl<'a> IdentityTransition<'a> {
    pub fn new(previous: &'a Identity, current: &'a Identity) -> Self {
        Self { previous, current }
    }

    /// Anonymous to a different, signed-in identity
    pub fn requires_cleanup(&self) -> bool {
        self.previous.anonymous && !self.current.anonymous && self.previous.uid != self.current.uid
    }

    pub fn registry_key(&self) -> String {
        format!("{}:{}", self.previous.uid, self.current.uid)
    }
}

/// Bounded set of handled transitions; the oldest entry is forgotten first
#[derive(Debug, Clone)]
pub struct CleanupRegistry {
    seen: VecDeque<String>,
    capacity: usize,
}

impl CleanupRegistry {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            seen: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `key`; false if it was already recorded
    pub fn claim(&mut self, key: &str) -> bool {
        if self.contains(key) {
            return false;
        }
        if self.seen.len() == self.capacity {
            self.seen.pop_front();
        }
        self.seen.push_back(key.to_string());
        true
    }

    /// Forget `key` so the transition can be handled again
    pub fn release(&mut self, key: &str) {
        self.seen.retain(|k| k != key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_cleanup() {
        let anon = Identity::anonymous("anon-1");
        let alice = Identity::authenticated("alice");
        let other_anon = Identity::anonymous("anon-2");

        assert!(IdentityTransition::new(&anon, &alice).requires_cleanup());
        assert!(!IdentityTransition::new(&alice, &anon).requires_cleanup());
        assert!(!IdentityTransition::new(&anon, &other_anon).requires_cleanup());
        assert!(!IdentityTransition::new(&alice, &Identity::authenticated("bob")).requires_cleanup());

        // Linking an anonymous account keeps the uid
        assert!(!IdentityTransition::new(&anon, &Identity::authenticated("anon-1")).requires_cleanup());
    }

    #[test]
    fn test_claim_once() {
        let mut registry = CleanupRegistry::new(4);
        assert!(registry.claim("anon-1:alice"));
        assert!(!registry.claim("anon-1:alice"));
        assert!(registry.claim("anon-2:alice"));

        registry.release("anon-1:alice");
        assert!(registry.claim("anon-1:alice"));
    }

    #[test]
    fn test_registry_is_bounded() {
        let mut registry = CleanupRegistry::new(2);
        registry.claim("a:x");
        registry.claim("b:x");
        registry.claim("c:x");

        assert_eq!(registry.len(), 2);
        assert!(!registry.contains("a:x"));
        assert!(registry.contains("c:x"));
    }
}
