//! Registry - central ECS container

use std::collections::HashMap;

use log::trace;

use super::component::{Component, ComponentStorage};
use super::entity::EntityAllocator;
use super::storage_table::StorageTable;
use super::type_registry::TypeKey;
use super::view::{View, ViewMut, ViewQuery};
use super::{EcsError, Entity, Result};

/// Registry holds all entities and components
///
/// Liveness goes through the [`EntityAllocator`], component access through
/// the [`StorageTable`]. The membership index records which component types
/// each live entity holds so that [`destroy`](Self::destroy) only touches
/// those storages.
#[derive(Default)]
pub struct Registry {
    entities: EntityAllocator,
    storages: StorageTable,
    membership: HashMap<Entity, Vec<TypeKey>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(entities: usize) -> Self {
        Self {
            entities: EntityAllocator::with_capacity(entities),
            storages: StorageTable::new(),
            membership: HashMap::with_capacity(entities),
        }
    }

    /// Create a new entity
    ///
    /// # Panics
    ///
    /// Panics when the 32-bit id space is exhausted; see
    /// [`try_create`](Self::try_create).
    pub fn create(&mut self) -> Entity {
        self.entities.create()
    }

    pub fn try_create(&mut self) -> Result<Entity> {
        self.entities.try_create()
    }

    /// Destroy an entity and remove all its components
    ///
    /// Components are dropped before the id goes back to the free list, so a
    /// recycled id never sees its previous occupant's data. Returns false
    /// for handles that are not alive.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }

        if let Some(keys) = self.membership.remove(&entity) {
            for key in keys {
                if let Some(storage) = self.storages.erased_mut(key) {
                    storage.erase(entity);
                }
            }
        }

        self.entities.destroy(entity)
    }

    /// Destroys every live entity. Storages stay registered.
    pub fn clear(&mut self) {
        let alive = self.entities.alive().to_vec();
        trace!("clearing {} entities", alive.len());
        for entity in alive {
            self.destroy(entity);
        }
    }

    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of alive entities
    pub fn len(&self) -> usize {
        self.entities.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.alive().iter().copied()
    }

    pub fn allocator(&self) -> &EntityAllocator {
        &self.entities
    }

    /// Attach `component`, replacing any previous value of the same type.
    pub fn emplace<T: Component>(&mut self, entity: Entity, component: T) -> Result<&mut T> {
        self.ensure_alive(entity)?;
        let storage = self.storages.ensure::<T>();
        let key = storage.type_key();
        let component = storage.emplace(entity, component);
        record(&mut self.membership, entity, key);
        Ok(component)
    }

    /// Attach a component built by a fallible constructor. When construction
    /// fails nothing changes, including any value already present.
    pub fn emplace_with<T, E>(
        &mut self,
        entity: Entity,
        construct: impl FnOnce() -> std::result::Result<T, E>,
    ) -> Result<&mut T>
    where
        T: Component,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        self.ensure_alive(entity)?;
        let component = construct().map_err(|source| EcsError::ComponentConstruction {
            component: std::any::type_name::<T>(),
            source: source.into(),
        })?;
        self.emplace(entity, component)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T> {
        self.ensure_alive(entity)?;
        match self.storages.find::<T>() {
            Some(storage) => storage.get(entity),
            None => Err(not_found::<T>(entity)),
        }
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        self.ensure_alive(entity)?;
        match self.storages.find_mut::<T>() {
            Some(storage) => storage.get_mut(entity),
            None => Err(not_found::<T>(entity)),
        }
    }

    /// Non-failing lookup; `None` for dead entities and missing components.
    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storages.find::<T>()?.try_get(entity)
    }

    pub fn try_get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.storages.find_mut::<T>()?.try_get_mut(entity)
    }

    /// Check if entity has a component
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.try_get::<T>(entity).is_some()
    }

    /// Detach and return the component. Dead entities and absent components
    /// are a no-op.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.is_alive(entity) {
            return None;
        }
        let storage = self.storages.find_mut::<T>()?;
        let key = storage.type_key();
        let removed = storage.remove(entity);
        forget(&mut self.membership, entity, key);
        removed
    }

    /// Component type keys currently attached to `entity`.
    pub fn component_types(&self, entity: Entity) -> &[TypeKey] {
        self.membership
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn type_key<T: Component>(&self) -> Option<TypeKey> {
        self.storages.types().get::<T>()
    }

    pub fn type_name(&self, key: TypeKey) -> Option<&'static str> {
        self.storages.types().name(key)
    }

    pub fn storages(&self) -> &StorageTable {
        &self.storages
    }

    /// Shared view over every entity holding all of `Q`'s components.
    pub fn view<Q: ViewQuery>(&self) -> View<'_, Q> {
        View::new(&self.storages)
    }

    /// Exclusive view; fails if `Q` names a component type twice.
    pub fn view_mut<Q: ViewQuery>(&mut self) -> Result<ViewMut<'_, Q>> {
        ViewMut::new(&mut self.storages)
    }

    /// Visit every entity holding a `T`.
    pub fn each<T: Component>(&mut self, mut f: impl FnMut(Entity, &mut T)) {
        if let Some(storage) = self.storages.find_mut::<T>() {
            for (entity, component) in storage.iter_mut() {
                f(entity, component);
            }
        }
    }

    fn ensure_alive(&self, entity: Entity) -> Result<()> {
        if self.entities.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::EntityNotAlive(entity))
        }
    }
}

fn not_found<T: Component>(entity: Entity) -> EcsError {
    EcsError::ComponentNotFound {
        entity,
        component: std::any::type_name::<T>(),
    }
}

fn record(membership: &mut HashMap<Entity, Vec<TypeKey>>, entity: Entity, key: TypeKey) {
    let keys = membership.entry(entity).or_default();
    if !keys.contains(&key) {
        keys.push(key);
    }
}

fn forget(membership: &mut HashMap<Entity, Vec<TypeKey>>, entity: Entity, key: TypeKey) {
    if let Some(keys) = membership.get_mut(&entity) {
        keys.retain(|&held| held != key);
        if keys.is_empty() {
            membership.remove(&entity);
        }
    }
}
