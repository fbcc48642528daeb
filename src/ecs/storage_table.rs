//! Type-erased table of component storages, indexed by [`TypeKey`]

use std::any::TypeId;

use log::debug;

use super::component::{Component, ComponentStorage, TypedComponentStorage};
use super::type_registry::{TypeKey, TypeRegistry};
use super::{EcsError, Result};

type ErasedStorage = dyn ComponentStorage + 'static;

#[derive(Default)]
pub struct StorageTable {
    types: TypeRegistry,
    storages: Vec<Option<Box<ErasedStorage>>>,
}

impl StorageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Storage for `T`, created and registered on first use.
    pub fn ensure<T: Component>(&mut self) -> &mut TypedComponentStorage<T> {
        let key = self.types.key_of::<T>();
        if key.index() >= self.storages.len() {
            self.storages.resize_with(key.index() + 1, || None);
        }
        let storage = self.storages[key.index()].get_or_insert_with(|| {
            debug!(
                "created storage for `{}` under key {key}",
                std::any::type_name::<T>()
            );
            Box::new(TypedComponentStorage::<T>::new(key))
        });
        storage
            .as_any_mut()
            .downcast_mut::<TypedComponentStorage<T>>()
            .expect("storage registered under another component type")
    }

    /// Non-creating lookup.
    pub fn find<T: Component>(&self) -> Option<&TypedComponentStorage<T>> {
        let key = self.types.get::<T>()?;
        self.erased(key)?
            .as_any()
            .downcast_ref::<TypedComponentStorage<T>>()
    }

    pub fn find_mut<T: Component>(&mut self) -> Option<&mut TypedComponentStorage<T>> {
        let key = self.types.get::<T>()?;
        self.erased_mut(key)?
            .as_any_mut()
            .downcast_mut::<TypedComponentStorage<T>>()
    }

    pub fn erased(&self, key: TypeKey) -> Option<&ErasedStorage> {
        self.storages.get(key.index())?.as_deref()
    }

    pub fn erased_mut(&mut self, key: TypeKey) -> Option<&mut ErasedStorage> {
        self.storages.get_mut(key.index())?.as_deref_mut()
    }

    /// Exclusive access to several storages at once.
    ///
    /// `requested` pairs each component's `TypeId` with its name. Fails if a
    /// type is requested twice; unregistered types come back as `None`.
    pub fn disjoint_mut<const N: usize>(
        &mut self,
        requested: [(TypeId, &'static str); N],
    ) -> Result<[Option<&mut ErasedStorage>; N]> {
        for (position, (type_id, name)) in requested.iter().enumerate() {
            if requested[..position].iter().any(|(other, _)| other == type_id) {
                return Err(EcsError::AliasedComponentAccess { component: *name });
            }
        }

        let keys: [Option<TypeKey>; N] =
            std::array::from_fn(|position| self.types.get_by_type_id(requested[position].0));
        let mut found: [Option<&mut ErasedStorage>; N] = std::array::from_fn(|_| None);
        for (index, slot) in self.storages.iter_mut().enumerate() {
            let wanted = keys
                .iter()
                .position(|key| key.map(TypeKey::index) == Some(index));
            if let Some(position) = wanted {
                found[position] = slot.as_deref_mut();
            }
        }
        Ok(found)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErasedStorage> {
        self.storages.iter().filter_map(|slot| slot.as_deref())
    }

    /// Number of materialized storages.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties every storage; keys and storages stay registered.
    pub fn clear(&mut self) {
        for storage in self.storages.iter_mut().flatten() {
            storage.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Entity;

    #[derive(Debug, PartialEq)]
    struct Position(i32, i32);
    #[derive(Debug, PartialEq)]
    struct Velocity(f32, f32);

    #[test]
    fn test_ensure_creates_lazily() {
        let mut table = StorageTable::new();
        assert!(table.find::<Position>().is_none());
        assert!(table.is_empty());

        table.ensure::<Position>().emplace(Entity::from_raw(1, 1), Position(1, 2));
        assert_eq!(table.len(), 1);

        let storage = table.find::<Position>().unwrap();
        assert_eq!(storage.get(Entity::from_raw(1, 1)).unwrap(), &Position(1, 2));
        assert!(table.find::<Velocity>().is_none());
    }

    #[test]
    fn test_ensure_returns_same_storage() {
        let mut table = StorageTable::new();
        table.ensure::<Velocity>().emplace(Entity::from_raw(1, 1), Velocity(1.0, 0.0));
        table.ensure::<Velocity>().emplace(Entity::from_raw(2, 1), Velocity(0.0, 1.0));

        let storage = table.find::<Velocity>().unwrap();
        assert_eq!(storage.len(), 2);
        assert_eq!(storage.get(Entity::from_raw(2, 1)).unwrap(), &Velocity(0.0, 1.0));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_erased_lookup_by_key() {
        let mut table = StorageTable::new();
        let entity = Entity::from_raw(3, 1);
        table.ensure::<Position>().emplace(entity, Position(0, 0));
        let key = table.types().get::<Position>().unwrap();

        let erased = table.erased_mut(key).unwrap();
        assert_eq!(erased.type_key(), key);
        assert!(erased.erase(entity));
        assert!(!table.find::<Position>().unwrap().has(entity));
    }

    #[test]
    fn test_disjoint_mut() {
        let mut table = StorageTable::new();
        table.ensure::<Position>();
        table.ensure::<Velocity>();

        let [vel, pos, missing] = table
            .disjoint_mut([
                (TypeId::of::<Velocity>(), "Velocity"),
                (TypeId::of::<Position>(), "Position"),
                (TypeId::of::<u8>(), "u8"),
            ])
            .unwrap();
        assert!(vel.unwrap().as_any().is::<TypedComponentStorage<Velocity>>());
        assert!(pos.unwrap().as_any().is::<TypedComponentStorage<Position>>());
        assert!(missing.is_none());
    }

    #[test]
    fn test_disjoint_mut_rejects_aliasing() {
        let mut table = StorageTable::new();
        table.ensure::<Position>();

        let result = table.disjoint_mut([
            (TypeId::of::<Position>(), "Position"),
            (TypeId::of::<Position>(), "Position"),
        ]);
        assert!(matches!(
            result,
            Err(EcsError::AliasedComponentAccess { component: "Position" })
        ));
    }
}
