//! Endpoint arena: `gitsu-core::Endpoint` values live here, addressed by
//! [`EndpointId`] rather than by pointer, so a rename never strands a
//! reference held in another table (spec §9, "Mutable identity keys").
//! The dependency graph the arena stores can be cyclic, so traversals
//! carry an ancestor set (see [`Arena::for_each_reachable`]).

use gitsu_core::{AHashSet, Endpoint, EndpointId};

/// Owns every [`Endpoint`] created during one `resolve()` run.
#[derive(Debug, Default)]
pub struct Arena {
    endpoints: Vec<Endpoint>,
}

impl Arena {
    /// An empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an endpoint, returning its id.
    pub fn insert(&mut self, endpoint: Endpoint) -> EndpointId {
        let id = EndpointId(self.endpoints.len() as u64);
        self.endpoints.push(endpoint);
        id
    }

    /// Borrow an endpoint.
    #[must_use]
    pub fn get(&self, id: EndpointId) -> &Endpoint {
        &self.endpoints[id.0 as usize]
    }

    /// Mutably borrow an endpoint.
    pub fn get_mut(&mut self, id: EndpointId) -> &mut Endpoint {
        &mut self.endpoints[id.0 as usize]
    }

    /// Number of endpoints ever created in this arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether any endpoint has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Walk the dependency graph rooted at `start`, calling `visit` once per
    /// reachable endpoint. Cycle-guarded: an id already on the current
    /// ancestor path is skipped, matching the `toData` cycle guard in spec
    /// §4.5.
    pub fn for_each_reachable(&self, start: EndpointId, mut visit: impl FnMut(EndpointId)) {
        let mut ancestors = AHashSet::default();
        self.walk(start, &mut ancestors, &mut visit);
    }

    fn walk(
        &self,
        id: EndpointId,
        ancestors: &mut AHashSet<EndpointId>,
        visit: &mut impl FnMut(EndpointId),
    ) {
        if !ancestors.insert(id) {
            return;
        }
        visit(id);
        let children: Vec<EndpointId> = self.get(id).dependencies.values().copied().collect();
        for child in children {
            self.walk(child, ancestors, visit);
        }
        ancestors.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_assigns_increasing_ids() {
        let mut arena = Arena::new();
        let a = arena.insert(Endpoint::new("a", "*", None));
        let b = arena.insert(Endpoint::new("b", "*", None));
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn cycle_guard_terminates_on_self_loop() {
        let mut arena = Arena::new();
        let a = arena.insert(Endpoint::new("a", "*", Some("a".into())));
        arena.get_mut(a).dependencies.insert("self".into(), a);

        let mut seen = Vec::new();
        arena.for_each_reachable(a, |id| seen.push(id));
        assert_eq!(seen, vec![a]);
    }

    #[test]
    fn cycle_guard_terminates_on_mutual_cycle() {
        let mut arena = Arena::new();
        let a = arena.insert(Endpoint::new("a", "*", Some("a".into())));
        let b = arena.insert(Endpoint::new("b", "*", Some("b".into())));
        arena.get_mut(a).dependencies.insert("b".into(), b);
        arena.get_mut(b).dependencies.insert("a".into(), a);

        let mut seen = Vec::new();
        arena.for_each_reachable(a, |id| seen.push(id));
        assert_eq!(seen.len(), 2);
    }
}
