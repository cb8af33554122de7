//! Run-scoped registry of every entity the orchestrator created

use super::types::{EntityKind, SpawnedEntity, WalkerPair};
use crate::world::ActorId;

#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    vehicles: Vec<SpawnedEntity>,
    walkers: Vec<WalkerPair>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed vehicle or fixed obstacle
    pub fn push_vehicle(&mut self, entity: SpawnedEntity) {
        debug_assert!(!matches!(
            entity.kind,
            EntityKind::Walker | EntityKind::WalkerController
        ));
        self.vehicles.push(entity);
    }

    /// Record a walker whose controller was also created
    pub fn push_pair(&mut self, pair: WalkerPair) {
        self.walkers.push(pair);
    }

    pub fn vehicles(&self) -> &[SpawnedEntity] {
        &self.vehicles
    }

    pub fn vehicle_ids(&self) -> Vec<ActorId> {
        self.vehicles.iter().map(|entity| entity.id).collect()
    }

    pub fn pairs(&self) -> &[WalkerPair] {
        &self.walkers
    }

    /// Controller then walker, pair by pair
    pub fn interleaved_walker_ids(&self) -> Vec<ActorId> {
        self.walkers
            .iter()
            .flat_map(|pair| [pair.controller, pair.walker])
            .collect()
    }

    pub fn count_of(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Walker | EntityKind::WalkerController => self.walkers.len(),
            _ => self.vehicles.iter().filter(|e| e.kind == kind).count(),
        }
    }

    /// Total number of actors held, controllers included
    pub fn len(&self) -> usize {
        self.vehicles.len() + self.walkers.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty() && self.walkers.is_empty()
    }

    /// Hand everything over for destruction, leaving the registry empty
    pub fn take(&mut self) -> EntityRegistry {
        std::mem::take(self)
    }
}
