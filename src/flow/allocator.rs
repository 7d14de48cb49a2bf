/// Node identifier allocation
///
/// Produces `node-<N>` identifiers that stay unique for the lifetime of an
/// editing session, absorbing identifiers loaded from persisted graphs so new
/// ones never collide with them. The allocator is plain constructor-injected
/// state owned by the graph; it must be `reset` and reseeded whenever a
/// different persisted workflow is loaded into the session.

use std::collections::HashSet;

/// Allocator for `node-<N>` identifiers
#[derive(Debug, Default, Clone)]
pub struct NodeIdAllocator {
    /// Next candidate numeric suffix
    counter: u64,
    /// Every identifier currently considered taken, conforming or not
    used: HashSet<String>,
}

/// Parse the numeric suffix of a conforming `node-<digits>` identifier
fn numeric_suffix(id: &str) -> Option<u64> {
    let digits = id.strip_prefix("node-")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every id in `ids` as used
    ///
    /// Conforming ids advance the counter to `max(current, suffix + 1)`;
    /// non-conforming ids are registered but leave the counter alone.
    pub fn load_from_nodes<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.register_id(id.into());
        }
    }

    /// Generate the next unique identifier and mark it used
    pub fn generate_id(&mut self) -> String {
        loop {
            let candidate = format!("node-{}", self.counter);
            self.counter += 1;
            if !self.used.contains(&candidate) {
                self.used.insert(candidate.clone());
                return candidate;
            }
        }
    }

    /// Mark an externally chosen identifier as used
    pub fn register_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        if let Some(n) = numeric_suffix(&id) {
            if n >= self.counter {
                self.counter = n + 1;
            }
        }
        self.used.insert(id);
    }

    /// Forget an identifier after its node is deleted
    ///
    /// The counter is not rewound: freed numeric suffixes are never reused.
    pub fn release_id(&mut self, id: &str) {
        self.used.remove(id);
    }

    pub fn is_used(&self, id: &str) -> bool {
        self.used.contains(id)
    }

    /// Clear counter and used set, for starting a fresh empty workflow
    pub fn reset(&mut self) {
        self.counter = 0;
        self.used.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_sequential_ids() {
        let mut alloc = NodeIdAllocator::new();
        assert_eq!(alloc.generate_id(), "node-0");
        assert_eq!(alloc.generate_id(), "node-1");
        assert_eq!(alloc.generate_id(), "node-2");
    }

    #[test]
    fn counter_advances_past_highest_seen_suffix() {
        let mut alloc = NodeIdAllocator::new();
        alloc.load_from_nodes(["node-0", "node-2"]);
        // node-1 is unused but must not be backfilled.
        assert_eq!(alloc.generate_id(), "node-3");
    }

    #[test]
    fn non_conforming_ids_are_used_but_do_not_move_the_counter() {
        let mut alloc = NodeIdAllocator::new();
        alloc.load_from_nodes(["webhook-start", "node-5x", "node-"]);
        assert!(alloc.is_used("webhook-start"));
        assert_eq!(alloc.generate_id(), "node-0");
    }

    #[test]
    fn generation_skips_colliding_proposals() {
        // Seed the used set without touching the counter to force the
        // proposal loop to walk over an occupied suffix.
        let mut alloc = NodeIdAllocator::new();
        alloc.used.insert("node-0".to_string());
        alloc.used.insert("node-1".to_string());
        assert_eq!(alloc.generate_id(), "node-2");
    }

    #[test]
    fn released_ids_are_not_reissued() {
        let mut alloc = NodeIdAllocator::new();
        let a = alloc.generate_id();
        let b = alloc.generate_id();
        alloc.release_id(&a);
        assert!(!alloc.is_used(&a));
        let c = alloc.generate_id();
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert_eq!(c, "node-2");
    }

    #[test]
    fn generated_ids_never_collide_with_loaded_ones() {
        let mut alloc = NodeIdAllocator::new();
        alloc.load_from_nodes(["node-0", "node-1", "node-2", "start"]);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10 {
            let id = alloc.generate_id();
            assert!(seen.insert(id.clone()), "duplicate id {id}");
            assert_ne!(id, "start");
        }
        assert_eq!(alloc.generate_id(), "node-13");
    }

    #[test]
    fn reset_starts_over() {
        let mut alloc = NodeIdAllocator::new();
        alloc.load_from_nodes(["node-7"]);
        alloc.reset();
        assert_eq!(alloc.generate_id(), "node-0");
    }
}
