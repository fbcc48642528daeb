//! Entity handles and their allocator

use std::fmt;

use log::trace;

use super::sparse_set::SparseSet;
use super::{EcsError, Result};

/// Version (generation) counter of an entity slot.
///
/// 32 bits wide. A recycled id gets `version + 1`, wrapping from
/// `Version::MAX` back to 1; 0 is never handed out.
pub type Version = u32;

/// Entity handle - an id slot plus the version of its current occupant.
///
/// Ordered and hashed by `(id, version)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity {
    id: u32,
    version: Version,
}

impl Entity {
    /// The "no entity" sentinel.
    pub const NULL: Self = Self { id: 0, version: 0 };

    /// Builds a handle from raw parts. Handles built this way are only alive
    /// if they match one issued by an allocator.
    #[inline]
    pub const fn from_raw(id: u32, version: Version) -> Self {
        Self { id, version }
    }

    #[inline]
    pub const fn id(self) -> u32 {
        self.id
    }

    #[inline]
    pub const fn version(self) -> Version {
        self.version
    }

    /// Structural validity only: says nothing about liveness.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.id != 0 && self.version != 0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.id == 0 && self.version == 0
    }

    /// Packs the handle as `version << 32 | id`.
    #[inline]
    pub const fn to_bits(self) -> u64 {
        ((self.version as u64) << 32) | self.id as u64
    }

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            id: bits as u32,
            version: (bits >> 32) as u32,
        }
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.id, self.version)
    }
}

#[inline]
fn next_version(version: Version) -> Version {
    if version == Version::MAX {
        1
    } else {
        version + 1
    }
}

/// Entity allocator
///
/// Ids start at 1 (0 belongs to [`Entity::NULL`]). Destroyed handles go on a
/// LIFO free list and come back with their version bumped on the next
/// [`create`](Self::create).
pub struct EntityAllocator {
    next_id: u32,
    free_list: Vec<Entity>,
    alive: SparseSet<Entity>,
    recycled: u64,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            free_list: Vec::new(),
            alive: SparseSet::new(),
            recycled: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_id: 1,
            free_list: Vec::new(),
            alive: SparseSet::with_capacity(capacity + 1),
            recycled: 0,
        }
    }

    /// Issues a handle, reusing the most recently freed id when there is one.
    ///
    /// # Panics
    ///
    /// Panics once all `u32::MAX` ids are live at the same time.
    pub fn create(&mut self) -> Entity {
        match self.try_create() {
            Ok(entity) => entity,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_create(&mut self) -> Result<Entity> {
        let entity = if let Some(dead) = self.free_list.pop() {
            self.recycled += 1;
            let entity = Entity::from_raw(dead.id(), next_version(dead.version()));
            trace!("recycled entity {dead} as {entity}");
            entity
        } else {
            if self.next_id == 0 {
                return Err(EcsError::EntityIdsExhausted);
            }
            let entity = Entity::from_raw(self.next_id, 1);
            // Wraps to 0 after u32::MAX, which marks the id space as spent.
            self.next_id = self.next_id.wrapping_add(1);
            trace!("allocated entity {entity}");
            entity
        };
        self.alive.insert(entity);
        Ok(entity)
    }

    /// Returns the handle's id to the free list. No-op (returns false) for
    /// handles that are not alive, including [`Entity::NULL`].
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if self.alive.remove(entity).is_none() {
            return false;
        }
        self.free_list.push(entity);
        trace!("destroyed entity {entity}");
        true
    }

    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.contains(entity)
    }

    /// Live handles in allocation-set order.
    #[inline]
    pub fn alive(&self) -> &[Entity] {
        self.alive.as_slice()
    }

    pub fn count(&self) -> usize {
        self.alive.len()
    }

    /// Number of ids waiting on the free list.
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Total number of creations served from the free list.
    pub fn recycled(&self) -> u64 {
        self.recycled
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet};

    #[test]
    fn test_null_entity() {
        assert!(!Entity::NULL.is_valid());
        assert!(Entity::NULL.is_null());
        assert_eq!(Entity::default(), Entity::NULL);
        assert!(Entity::from_raw(42, 3).is_valid());
        assert!(!Entity::from_raw(42, 0).is_valid());
        assert!(!Entity::from_raw(0, 3).is_valid());
    }

    #[test]
    fn test_entity_equality_hash_and_order() {
        let a = Entity::from_raw(1, 1);
        let b = Entity::from_raw(2, 1);
        let c = Entity::from_raw(1, 2);

        assert_eq!(a, Entity::from_raw(1, 1));
        assert_ne!(a, c);
        assert!(a < b);
        assert!(a < c);
        assert!(c < b);

        let hashed: HashSet<Entity> = [a, b, c, a].into_iter().collect();
        assert_eq!(hashed.len(), 3);
        let ordered: BTreeSet<Entity> = [c, b, a].into_iter().collect();
        assert_eq!(ordered.into_iter().collect::<Vec<_>>(), vec![a, c, b]);
    }

    #[test]
    fn test_entity_bits() {
        let entity = Entity::from_raw(12345, 67890);
        assert_eq!(Entity::from_bits(entity.to_bits()), entity);
        assert_eq!(entity.to_string(), "12345v67890");
    }

    #[test]
    fn test_entity_allocation() {
        let mut allocator = EntityAllocator::new();

        let e1 = allocator.create();
        assert_eq!(e1, Entity::from_raw(1, 1));
        assert!(allocator.is_alive(e1));

        let e2 = allocator.create();
        assert_eq!(e2, Entity::from_raw(2, 1));
        assert!(allocator.is_alive(e2));

        assert_eq!(allocator.count(), 2);
        assert!(!allocator.is_alive(Entity::NULL));
    }

    #[test]
    fn test_entity_destroy_and_reuse() {
        let mut allocator = EntityAllocator::new();

        let e1 = allocator.create();
        let e2 = allocator.create();

        assert!(allocator.destroy(e1));
        assert!(!allocator.is_alive(e1));
        assert!(allocator.is_alive(e2));
        assert_eq!(allocator.count(), 1);

        let e3 = allocator.create();
        assert_eq!(e3.id(), e1.id());
        assert_eq!(e3.version(), 2);
        assert!(!allocator.is_alive(e1), "stale handle must stay dead");
        assert!(allocator.is_alive(e3));
        assert_eq!(allocator.recycled(), 1);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut allocator = EntityAllocator::new();
        let e = allocator.create();

        assert!(allocator.destroy(e));
        assert!(!allocator.destroy(e));
        assert!(!allocator.destroy(Entity::NULL));
        assert!(!allocator.destroy(Entity::from_raw(99, 1)));
        assert_eq!(allocator.free_count(), 1);
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut allocator = EntityAllocator::new();
        let a = allocator.create();
        let b = allocator.create();

        allocator.destroy(a);
        allocator.destroy(b);

        assert_eq!(allocator.create().id(), b.id());
        assert_eq!(allocator.create().id(), a.id());
    }

    #[test]
    fn test_versions_never_repeat_or_hit_zero() {
        let mut allocator = EntityAllocator::new();
        let mut seen = HashSet::new();
        let mut entity = allocator.create();
        for _ in 0..1_000 {
            assert!(seen.insert(entity.version()));
            assert_ne!(entity.version(), 0);
            allocator.destroy(entity);
            entity = allocator.create();
            assert_eq!(entity.id(), 1);
        }
    }

    #[test]
    fn test_version_wraps_to_one() {
        let mut allocator = EntityAllocator::new();
        let e = allocator.create();
        allocator.destroy(e);
        allocator.free_list.clear();
        allocator.free_list.push(Entity::from_raw(e.id(), Version::MAX));

        let wrapped = allocator.create();
        assert_eq!(wrapped, Entity::from_raw(e.id(), 1));
    }

    #[test]
    fn test_id_space_exhaustion() {
        let mut allocator = EntityAllocator::new();
        let e = allocator.create();
        allocator.next_id = 0;

        assert!(matches!(
            allocator.try_create(),
            Err(EcsError::EntityIdsExhausted)
        ));

        allocator.destroy(e);
        assert_eq!(allocator.try_create().unwrap(), Entity::from_raw(e.id(), 2));
    }
}
