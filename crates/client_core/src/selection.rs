//! Set of products the operator has marked as already sold to the client.

use shared::domain::ProductId;

/// Set semantics with deterministic insertion-order iteration. Only explicit
/// `add`/`remove` mutate it; a catalog reload never touches it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoldProducts {
    members: Vec<ProductId>,
}

impl SoldProducts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `id`. Idempotent for existing members; empty ids are ignored.
    /// Returns whether the set changed.
    pub fn add(&mut self, id: ProductId) -> bool {
        if id.as_str().is_empty() || self.members.contains(&id) {
            return false;
        }
        self.members.push(id);
        true
    }

    /// Removes `id` if present. Returns whether the set changed.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.members.len();
        self.members.retain(|member| member != id);
        self.members.len() != before
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.members.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Current members in insertion order, for payload construction.
    pub fn to_vec(&self) -> Vec<ProductId> {
        self.members.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductId> {
        self.members.iter()
    }
}
