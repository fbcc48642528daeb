//! Component type keys
//!
//! Keys are handed out from a single counter owned by the registry instance,
//! in first-use order, and never reused for another type.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use log::debug;

/// Dense, sequential identifier of a component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeKey(u32);

impl TypeKey {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    keys: HashMap<TypeId, TypeKey>,
    names: Vec<&'static str>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for `T`, assigning the next one on first use.
    pub fn key_of<T: 'static>(&mut self) -> TypeKey {
        if let Some(key) = self.get::<T>() {
            return key;
        }
        let key = TypeKey(self.names.len() as u32);
        let name = type_name::<T>();
        self.keys.insert(TypeId::of::<T>(), key);
        self.names.push(name);
        debug!("assigned type key {key} to `{name}`");
        key
    }

    /// Key for `T` if it has been used before.
    #[inline]
    pub fn get<T: 'static>(&self) -> Option<TypeKey> {
        self.get_by_type_id(TypeId::of::<T>())
    }

    #[inline]
    pub fn get_by_type_id(&self, type_id: TypeId) -> Option<TypeKey> {
        self.keys.get(&type_id).copied()
    }

    pub fn name(&self, key: TypeKey) -> Option<&'static str> {
        self.names.get(key.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeKey, &'static str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (TypeKey(index as u32), *name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    struct Velocity;
    struct Tag;

    #[test]
    fn test_keys_are_sequential_and_stable() {
        let mut types = TypeRegistry::new();

        let pos = types.key_of::<Position>();
        let vel = types.key_of::<Velocity>();
        let tag = types.key_of::<Tag>();

        assert_eq!(pos.index(), 0);
        assert_eq!(vel.index(), 1);
        assert_eq!(tag.index(), 2);
        assert_eq!(types.key_of::<Position>(), pos);
        assert_eq!(types.key_of::<Velocity>(), vel);
        assert_eq!(types.len(), 3);
    }

    #[test]
    fn test_lookup_does_not_assign() {
        let mut types = TypeRegistry::new();
        assert_eq!(types.get::<Position>(), None);
        assert!(types.is_empty());

        let key = types.key_of::<Position>();
        assert_eq!(types.get::<Position>(), Some(key));
        assert!(types.name(key).unwrap().ends_with("Position"));
        assert_eq!(types.name(TypeKey(7)), None);
    }

    #[test]
    fn test_registries_are_independent() {
        let mut first = TypeRegistry::new();
        let mut second = TypeRegistry::new();

        first.key_of::<Position>();
        let vel_first = first.key_of::<Velocity>();
        let vel_second = second.key_of::<Velocity>();

        assert_eq!(vel_first.index(), 1);
        assert_eq!(vel_second.index(), 0);
    }
}
