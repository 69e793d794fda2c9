//! Entity/component system (minimal ECS).
//!
//! This is a deliberately small ECS suitable for deterministic simulation.
//! It is not archetype-based; instead it uses typed component storages keyed
//! by entity id. Storages are ordered maps so iteration order is stable.

use std::{
    any::{Any, TypeId},
    collections::{BTreeMap, HashMap},
};

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Opaque entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

type Storage<T> = BTreeMap<EntityId, T>;

/// Simple world that can store typed components.
#[derive(Default)]
pub struct World {
    next_id: u64,
    storages: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl World {
    /// Creates a new entity.
    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Inserts/replaces a component for an entity.
    pub fn insert<T: 'static + Send + Sync>(&mut self, entity: EntityId, component: T) {
        self.storage_mut::<T>().insert(entity, component);
    }

    /// Removes a component from an entity, returning it.
    pub fn remove<T: 'static + Send + Sync>(&mut self, entity: EntityId) -> Option<T> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<Storage<T>>())
            .and_then(|storage| storage.remove(&entity))
    }

    /// Gets a component reference.
    pub fn get<T: 'static + Send + Sync>(&self, entity: EntityId) -> Option<&T> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<Storage<T>>())
            .and_then(|storage| storage.get(&entity))
    }

    /// Gets a mutable component reference.
    pub fn get_mut<T: 'static + Send + Sync>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<Storage<T>>())
            .and_then(|storage| storage.get_mut(&entity))
    }

    /// Iterates entities with a given component.
    pub fn iter<T: 'static + Send + Sync>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<Storage<T>>())
            .into_iter()
            .flat_map(|storage| storage.iter().map(|(k, v)| (*k, v)))
    }

    /// Iterates entities with a given component, mutably.
    pub fn iter_mut<T: 'static + Send + Sync>(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<Storage<T>>())
            .into_iter()
            .flat_map(|storage| storage.iter_mut().map(|(k, v)| (*k, v)))
    }

    /// Number of entities carrying component `T`.
    pub fn count<T: 'static + Send + Sync>(&self) -> usize {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<Storage<T>>())
            .map_or(0, |storage| storage.len())
    }

    /// Visits every entity that has both an `A` and a `B`, with mutable
    /// access to both, in ascending entity order.
    ///
    /// `A` and `B` must be different component types.
    pub fn each_mut<A, B, F>(&mut self, mut f: F)
    where
        A: 'static + Send + Sync,
        B: 'static + Send + Sync,
        F: FnMut(EntityId, &mut A, &mut B),
    {
        assert_ne!(
            TypeId::of::<A>(),
            TypeId::of::<B>(),
            "each_mut needs two distinct component types"
        );

        // Detach the second storage so both can be borrowed mutably.
        let Some(mut detached) = self.storages.remove(&TypeId::of::<B>()) else {
            return;
        };
        if let (Some(bs), Some(a_storage)) = (
            detached.downcast_mut::<Storage<B>>(),
            self.storages
                .get_mut(&TypeId::of::<A>())
                .and_then(|boxed| boxed.downcast_mut::<Storage<A>>()),
        ) {
            for (id, a) in a_storage.iter_mut() {
                if let Some(b) = bs.get_mut(id) {
                    f(*id, a, b);
                }
            }
        }
        self.storages.insert(TypeId::of::<B>(), detached);
    }

    fn storage_mut<T: 'static + Send + Sync>(&mut self) -> &mut Storage<T> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Storage::<T>::new()))
            .downcast_mut::<Storage<T>>()
            .expect("storage type mismatch")
    }
}

/// Visual transform of an entity, in visual-space units.
///
/// `rotation` is in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: f32,
}

impl Transform {
    pub const fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }
}
