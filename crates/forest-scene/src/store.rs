//! In-memory ownership of the scene's creatures.
//!
//! Four pieces of state, all keyed by normalized filename:
//!
//! | Field      | Meaning                                                   |
//! |------------|-----------------------------------------------------------|
//! | `spawned`  | Every creature ever observed this session. Only grows.    |
//! | `queue`    | Creatures waiting for their cinematic, FIFO.              |
//! | `entities` | Creatures whose image loaded and that are live in-scene.  |
//! | `rendered` | Keys of `entities`, reported back to the backend.         |
//!
//! A key enters `queue` at most once because it is gated on `spawned`
//! membership at discovery time. Only [`SceneStore::clear`] shrinks the
//! store.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use forest_types::CreatureRecord;

use crate::entity::Entity;

/// Dedup sets, spawn queue, and the id-to-entity map.
#[derive(Debug, Default)]
pub struct SceneStore {
    spawned: HashSet<String>,
    rendered: BTreeSet<String>,
    queue: VecDeque<CreatureRecord>,
    entities: HashMap<String, Entity>,
    initial_sync_done: bool,
}

impl SceneStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the baseline roster has been materialized.
    pub const fn initial_sync_done(&self) -> bool {
        self.initial_sync_done
    }

    /// Record the baseline roster.
    ///
    /// Every record not yet seen is added to the spawned set and returned
    /// for immediate, silent materialization. Nothing is queued.
    pub fn initial_sync(&mut self, records: Vec<CreatureRecord>) -> Vec<CreatureRecord> {
        let fresh = self.admit(records);
        self.initial_sync_done = true;
        fresh
    }

    /// Queue every record not yet seen. Returns how many were queued.
    pub fn enqueue_new(&mut self, records: Vec<CreatureRecord>) -> usize {
        let fresh = self.admit(records);
        let count = fresh.len();
        self.queue.extend(fresh);
        count
    }

    fn admit(&mut self, records: Vec<CreatureRecord>) -> Vec<CreatureRecord> {
        records
            .into_iter()
            .filter(|record| {
                let key = record.key();
                !key.is_empty() && self.spawned.insert(key)
            })
            .collect()
    }

    /// Take the next creature awaiting its cinematic.
    pub fn pop_next(&mut self) -> Option<CreatureRecord> {
        self.queue.pop_front()
    }

    /// Number of creatures awaiting their cinematic.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Keys waiting in the queue, head first.
    pub fn queued_keys(&self) -> Vec<String> {
        self.queue.iter().map(CreatureRecord::key).collect()
    }

    /// Whether `key` has ever been observed.
    pub fn is_spawned(&self, key: &str) -> bool {
        self.spawned.contains(key)
    }

    /// Number of creatures ever observed.
    pub fn spawned_len(&self) -> usize {
        self.spawned.len()
    }

    /// Add a materialized entity and mark it rendered.
    ///
    /// Returns `false` (and drops `entity`) when the key is already live or
    /// was forgotten by a [`SceneStore::clear`] while its image loaded.
    pub fn insert_entity(&mut self, entity: Entity) -> bool {
        if !self.spawned.contains(&entity.key) || self.entities.contains_key(&entity.key) {
            return false;
        }
        self.rendered.insert(entity.key.clone());
        self.entities.insert(entity.key.clone(), entity);
        true
    }

    /// Live entity by normalized filename.
    pub fn entity(&self, key: &str) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// All live entities, for the render loop.
    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Number of live entities.
    pub fn live_count(&self) -> usize {
        self.entities.len()
    }

    /// Rendered keys in stable order.
    pub fn rendered(&self) -> Vec<String> {
        self.rendered.iter().cloned().collect()
    }

    /// Forget everything, including the baseline.
    ///
    /// `initial_sync_done` stays set: creatures approved after a clear are
    /// new arrivals and get their cinematic.
    pub fn clear(&mut self) {
        self.spawned.clear();
        self.rendered.clear();
        self.queue.clear();
        self.entities.clear();
    }
}
