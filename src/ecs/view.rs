//! Multi-component views
//!
//! A view is built from a tuple of component types, `(A,)` up to eight
//! elements, and visits every entity holding all of them exactly once.
//! Iteration is driven by the smallest of the requested storages; the order
//! carries no meaning.
//!
//! [`View`] hands out shared references through a plain lazy [`Iterator`].
//! [`ViewMut`] hands out exclusive references, so it iterates internally via
//! [`ViewMut::for_each`]: each entity's references are released before the
//! next entity is visited. Both hold a borrow of the registry, so entities
//! and components cannot be added or removed while a view is alive.

use std::any::{type_name, Any, TypeId};

use super::component::{Component, TypedComponentStorage};
use super::storage_table::StorageTable;
use super::{Entity, Result};

/// A tuple of component types that can be viewed together.
pub trait ViewQuery: 'static {
    type Storages<'w>: Copy;
    type Item<'w>;
    type StoragesMut<'w>;
    type ItemMut<'a>;

    /// `None` when any of the storages was never created.
    fn fetch(table: &StorageTable) -> Option<Self::Storages<'_>>;
    fn fetch_mut(table: &mut StorageTable) -> Result<Option<Self::StoragesMut<'_>>>;

    fn driver<'w>(storages: Self::Storages<'w>) -> &'w [Entity];
    fn get<'w>(storages: Self::Storages<'w>, entity: Entity) -> Option<Self::Item<'w>>;

    fn driver_mut<'a>(storages: &'a Self::StoragesMut<'_>) -> &'a [Entity];
    fn contains_mut(storages: &Self::StoragesMut<'_>, entity: Entity) -> bool;
    fn get_mut<'a>(
        storages: &'a mut Self::StoragesMut<'_>,
        entity: Entity,
    ) -> Option<Self::ItemMut<'a>>;

    fn matching_mut(storages: &Self::StoragesMut<'_>) -> Vec<Entity> {
        Self::driver_mut(storages)
            .iter()
            .copied()
            .filter(|&entity| Self::contains_mut(storages, entity))
            .collect()
    }

    fn for_each_mut<F>(storages: &mut Self::StoragesMut<'_>, mut f: F)
    where
        F: FnMut(Entity, Self::ItemMut<'_>),
    {
        for entity in Self::matching_mut(storages) {
            if let Some(item) = Self::get_mut(storages, entity) {
                f(entity, item);
            }
        }
    }
}

fn smallest<const N: usize>(candidates: [&[Entity]; N]) -> &[Entity] {
    candidates
        .into_iter()
        .min_by_key(|entities| entities.len())
        .unwrap_or(&[])
}

fn downcast_mut<'a, T: Component>(
    storage: Option<&'a mut (dyn super::ComponentStorage + 'static)>,
) -> Option<&'a mut TypedComponentStorage<T>> {
    let any: &'a mut dyn Any = storage?.as_any_mut();
    any.downcast_mut::<TypedComponentStorage<T>>()
}

macro_rules! impl_view_query {
    ($($name:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($name: Component),+> ViewQuery for ($($name,)+) {
            type Storages<'w> = ($(&'w TypedComponentStorage<$name>,)+);
            type Item<'w> = ($(&'w $name,)+);
            type StoragesMut<'w> = ($(&'w mut TypedComponentStorage<$name>,)+);
            type ItemMut<'a> = ($(&'a mut $name,)+);

            fn fetch(table: &StorageTable) -> Option<Self::Storages<'_>> {
                Some(($(table.find::<$name>()?,)+))
            }

            fn fetch_mut(table: &mut StorageTable) -> Result<Option<Self::StoragesMut<'_>>> {
                let [$($name,)+] = table.disjoint_mut([
                    $((TypeId::of::<$name>(), type_name::<$name>()),)+
                ])?;
                Ok(match ($(downcast_mut::<$name>($name),)+) {
                    ($(Some($name),)+) => Some(($($name,)+)),
                    _ => None,
                })
            }

            fn driver<'w>(storages: Self::Storages<'w>) -> &'w [Entity] {
                let ($($name,)+) = storages;
                smallest([$($name.entities(),)+])
            }

            fn get<'w>(storages: Self::Storages<'w>, entity: Entity) -> Option<Self::Item<'w>> {
                let ($($name,)+) = storages;
                Some(($($name.try_get(entity)?,)+))
            }

            fn driver_mut<'a>(storages: &'a Self::StoragesMut<'_>) -> &'a [Entity] {
                let ($($name,)+) = storages;
                smallest([$($name.entities(),)+])
            }

            fn contains_mut(storages: &Self::StoragesMut<'_>, entity: Entity) -> bool {
                let ($($name,)+) = storages;
                true $(&& $name.has(entity))+
            }

            fn get_mut<'a>(
                storages: &'a mut Self::StoragesMut<'_>,
                entity: Entity,
            ) -> Option<Self::ItemMut<'a>> {
                let ($($name,)+) = storages;
                Some(($($name.try_get_mut(entity)?,)+))
            }
        }
    };
}

impl_view_query!(A);
impl_view_query!(A, B);
impl_view_query!(A, B, C);
impl_view_query!(A, B, C, D);
impl_view_query!(A, B, C, D, E);
impl_view_query!(A, B, C, D, E, F);
impl_view_query!(A, B, C, D, E, F, G);
impl_view_query!(A, B, C, D, E, F, G, H);

/// Shared, restartable view over `Q`.
pub struct View<'w, Q: ViewQuery> {
    storages: Option<Q::Storages<'w>>,
}

impl<'w, Q: ViewQuery> View<'w, Q> {
    pub(crate) fn new(table: &'w StorageTable) -> Self {
        Self {
            storages: Q::fetch(table),
        }
    }

    /// Starts a fresh pass over the matching entities.
    pub fn iter(&self) -> ViewIter<'w, Q> {
        let entities = match self.storages {
            Some(storages) => Q::driver(storages),
            None => &[],
        };
        ViewIter {
            storages: self.storages,
            entities: entities.iter(),
        }
    }

    pub fn get(&self, entity: Entity) -> Option<Q::Item<'w>> {
        Q::get(self.storages?, entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<'a, 'w, Q: ViewQuery> IntoIterator for &'a View<'w, Q> {
    type Item = (Entity, Q::Item<'w>);
    type IntoIter = ViewIter<'w, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct ViewIter<'w, Q: ViewQuery> {
    storages: Option<Q::Storages<'w>>,
    entities: std::slice::Iter<'w, Entity>,
}

impl<'w, Q: ViewQuery> Iterator for ViewIter<'w, Q> {
    type Item = (Entity, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        let storages = self.storages?;
        for &entity in self.entities.by_ref() {
            if let Some(item) = Q::get(storages, entity) {
                return Some((entity, item));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.entities.len()))
    }
}

/// Exclusive, restartable view over `Q`.
pub struct ViewMut<'w, Q: ViewQuery> {
    storages: Option<Q::StoragesMut<'w>>,
}

impl<'w, Q: ViewQuery> ViewMut<'w, Q> {
    pub(crate) fn new(table: &'w mut StorageTable) -> Result<Self> {
        Ok(Self {
            storages: Q::fetch_mut(table)?,
        })
    }

    /// Calls `f` once for every matching entity.
    pub fn for_each<F>(&mut self, f: F)
    where
        F: FnMut(Entity, Q::ItemMut<'_>),
    {
        if let Some(storages) = self.storages.as_mut() {
            Q::for_each_mut(storages, f);
        }
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<Q::ItemMut<'_>> {
        Q::get_mut(self.storages.as_mut()?, entity)
    }

    /// Snapshot of the matching entities.
    pub fn entities(&self) -> Vec<Entity> {
        self.storages
            .as_ref()
            .map(Q::matching_mut)
            .unwrap_or_default()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.storages
            .as_ref()
            .is_some_and(|storages| Q::contains_mut(storages, entity))
    }

    pub fn count(&self) -> usize {
        self.entities().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}
