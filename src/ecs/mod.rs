//! Entity Component System (ECS) core
//!
//! Entities are versioned handles issued by an [`EntityAllocator`].
//! Components of each type live in their own sparse-set storage, created the
//! first time the type is used. The [`Registry`] ties the two together and
//! answers multi-component [`View`]s.

pub mod component;
pub mod entity;
pub mod error;
pub mod registry;
pub mod sparse_set;
pub mod storage_table;
pub mod type_registry;
pub mod view;

pub use component::{Component, ComponentStorage, TypedComponentStorage};
pub use entity::{Entity, EntityAllocator, Version};
pub use error::{EcsError, Result};
pub use registry::Registry;
pub use sparse_set::SparseSet;
pub use storage_table::StorageTable;
pub use type_registry::{TypeKey, TypeRegistry};
pub use view::{View, ViewIter, ViewMut, ViewQuery};
