//! Component storage
//!
//! Each component type lives in its own [`TypedComponentStorage`], a sparse
//! set keyed by entity with the values packed in a parallel dense array.
//! [`ComponentStorage`] is the type-erased face the registry uses to clean up
//! after an entity without knowing its component types.

use std::any::{type_name, Any};

use log::trace;

use super::sparse_set::SparseSet;
use super::type_registry::TypeKey;
use super::{EcsError, Entity, Result};

/// Anything `'static` can be a component; there is no registration step.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Type-erased component storage
pub trait ComponentStorage {
    fn type_key(&self) -> TypeKey;
    fn type_name(&self) -> &'static str;
    /// Drops the entity's value if present.
    fn erase(&mut self, entity: Entity) -> bool;
    fn has(&self, entity: Entity) -> bool;
    fn entities(&self) -> &[Entity];
    fn clear(&mut self);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Concrete storage for a specific component type
pub struct TypedComponentStorage<T: Component> {
    key: TypeKey,
    index: SparseSet<Entity>,
    data: Vec<T>,
}

impl<T: Component> TypedComponentStorage<T> {
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            index: SparseSet::new(),
            data: Vec::new(),
        }
    }

    /// Stores `component` under `entity`, replacing any previous value.
    ///
    /// The replacement is fully built before the old value is dropped. An
    /// entry left behind by an older version of the same id is evicted.
    pub fn emplace(&mut self, entity: Entity, component: T) -> &mut T {
        let len = self.index.len();
        if let Some(slot) = self.index.slot(entity) {
            let previous = self.index.as_slice()[slot];
            if previous != entity {
                trace!(
                    "evicting stale `{}` of {previous} for {entity}",
                    type_name::<T>()
                );
            }
        }
        let index = self.index.insert(entity);
        if index == len {
            self.data.push(component);
        } else {
            self.data[index] = component;
        }
        &mut self.data[index]
    }

    /// Like [`emplace`](Self::emplace) with a fallible constructor. On error
    /// the storage is left untouched.
    pub fn emplace_with<E>(
        &mut self,
        entity: Entity,
        construct: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<&mut T, E> {
        let component = construct()?;
        Ok(self.emplace(entity, component))
    }

    pub fn get(&self, entity: Entity) -> Result<&T> {
        self.try_get(entity).ok_or_else(|| Self::not_found(entity))
    }

    pub fn get_mut(&mut self, entity: Entity) -> Result<&mut T> {
        match self.index.position(entity) {
            Some(index) => Ok(&mut self.data[index]),
            None => Err(Self::not_found(entity)),
        }
    }

    #[inline]
    pub fn try_get(&self, entity: Entity) -> Option<&T> {
        self.index.position(entity).map(|index| &self.data[index])
    }

    #[inline]
    pub fn try_get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.index.position(entity).map(|index| &mut self.data[index])
    }

    #[inline]
    pub fn has(&self, entity: Entity) -> bool {
        self.index.contains(entity)
    }

    /// Takes the entity's value out. Absent entries are not an error.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let index = self.index.remove(entity)?;
        Some(self.data.swap_remove(index))
    }

    /// Positional access into the dense array.
    pub fn get_at(&self, index: usize) -> Result<(Entity, &T)> {
        let entity = self.index.get(index)?;
        Ok((entity, &self.data[index]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.index.iter().zip(self.data.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.index.iter().zip(self.data.iter_mut())
    }

    #[inline]
    pub fn entities(&self) -> &[Entity] {
        self.index.as_slice()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.data.clear();
    }

    fn not_found(entity: Entity) -> EcsError {
        EcsError::ComponentNotFound {
            entity,
            component: type_name::<T>(),
        }
    }
}

impl<T: Component> ComponentStorage for TypedComponentStorage<T> {
    fn type_key(&self) -> TypeKey {
        self.key
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn erase(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn has(&self, entity: Entity) -> bool {
        TypedComponentStorage::has(self, entity)
    }

    fn entities(&self) -> &[Entity] {
        TypedComponentStorage::entities(self)
    }

    fn clear(&mut self) {
        TypedComponentStorage::clear(self)
    }

    fn len(&self) -> usize {
        TypedComponentStorage::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::TypeRegistry;
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    fn storage<T: Component>() -> TypedComponentStorage<T> {
        TypedComponentStorage::new(TypeRegistry::new().key_of::<T>())
    }

    fn e(id: u32) -> Entity {
        Entity::from_raw(id, 1)
    }

    #[test]
    fn test_component_storage() {
        let mut storage = storage::<Position>();

        storage.emplace(e(1), Position { x: 1.0, y: 2.0 });
        storage.emplace(e(2), Position { x: 3.0, y: 4.0 });

        assert_eq!(storage.len(), 2);
        assert!(storage.has(e(1)));
        assert!(storage.has(e(2)));
        assert!(!storage.has(e(3)));

        let pos = storage.get(e(1)).unwrap();
        assert_eq!(pos.x, 1.0);
        assert_eq!(pos.y, 2.0);

        assert_eq!(storage.remove(e(1)), Some(Position { x: 1.0, y: 2.0 }));
        assert!(!storage.has(e(1)));
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get(e(2)).unwrap(), &Position { x: 3.0, y: 4.0 });
    }

    #[test]
    fn test_component_iteration() {
        let mut storage = storage::<Position>();

        storage.emplace(e(1), Position { x: 1.0, y: 2.0 });
        storage.emplace(e(2), Position { x: 3.0, y: 4.0 });

        assert_eq!(storage.iter().count(), 2);

        for (_entity, pos) in storage.iter_mut() {
            pos.x += 1.0;
        }

        assert_eq!(storage.get(e(1)).unwrap().x, 2.0);
        assert_eq!(storage.get(e(2)).unwrap().x, 4.0);
    }

    #[test]
    fn test_emplace_overwrites() {
        let mut storage = storage::<Position>();

        storage.emplace(e(1), Position { x: 1.0, y: 2.0 });
        let pos = storage.emplace(e(1), Position { x: 5.0, y: 6.0 });
        assert_eq!(*pos, Position { x: 5.0, y: 6.0 });
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_overwrite_drops_previous_value() {
        let mut storage = storage::<Rc<()>>();
        let first = Rc::new(());
        storage.emplace(e(1), Rc::clone(&first));
        assert_eq!(Rc::strong_count(&first), 2);

        storage.emplace(e(1), Rc::new(()));
        assert_eq!(Rc::strong_count(&first), 1);

        storage.emplace(e(2), Rc::clone(&first));
        storage.clear();
        assert_eq!(Rc::strong_count(&first), 1);
    }

    #[test]
    fn test_failed_construction_keeps_previous_value() {
        let mut storage = storage::<Position>();
        storage.emplace(e(1), Position { x: 1.0, y: 2.0 });

        let result = storage.emplace_with(e(1), || Err::<Position, _>("boom"));
        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(storage.get(e(1)).unwrap(), &Position { x: 1.0, y: 2.0 });
    }

    #[test]
    fn test_missing_component() {
        let mut storage = storage::<Position>();

        assert!(matches!(
            storage.get(e(7)),
            Err(EcsError::ComponentNotFound { entity, .. }) if entity == e(7)
        ));
        assert!(storage.get_mut(e(7)).is_err());
        assert_eq!(storage.remove(e(7)), None);
    }

    #[test]
    fn test_version_mismatch_is_not_a_hit() {
        let mut storage = storage::<Position>();
        let old = Entity::from_raw(3, 1);
        let new = Entity::from_raw(3, 2);

        storage.emplace(old, Position { x: 1.0, y: 1.0 });
        assert!(!storage.has(new));
        assert!(storage.try_get(new).is_none());

        storage.emplace(new, Position { x: 2.0, y: 2.0 });
        assert!(!storage.has(old));
        assert_eq!(storage.get(new).unwrap().x, 2.0);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_positional_access() {
        let mut storage = storage::<Position>();
        storage.emplace(e(4), Position { x: 0.0, y: 0.0 });

        let (entity, _) = storage.get_at(0).unwrap();
        assert_eq!(entity, e(4));
        assert!(matches!(
            storage.get_at(1),
            Err(EcsError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_erased_interface() {
        let mut typed = storage::<Position>();
        typed.emplace(e(1), Position { x: 0.0, y: 0.0 });

        let erased: &mut dyn ComponentStorage = &mut typed;
        assert!(erased.has(e(1)));
        assert_eq!(erased.entities(), &[e(1)]);
        assert!(erased.type_name().ends_with("Position"));
        assert!(erased.erase(e(1)));
        assert!(!erased.erase(e(1)));
        assert!(erased.is_empty());
        assert!(erased
            .as_any()
            .downcast_ref::<TypedComponentStorage<Position>>()
            .is_some());
    }
}
