//! Control object identity and per-type registries.
//!
//! Every hardware-facing type implements [`Control`]. Instances are created
//! once by the [`Board`](crate::board::Board), wrapped in a [`Shared`] handle
//! whose mutex is the object's exclusive lock, and published in a
//! [`Registry`] keyed by [`ControlId`]. Commands look instances up by id;
//! a miss is reported to the caller as `PARAM_OUT_OF_RANGE`.
//!
//! ```
//! use controld_core::ControlId;
//! use controld_hardware::control::{Control, Registry};
//!
//! struct Lamp(ControlId);
//!
//! impl Control for Lamp {
//!     const KIND: &'static str = "lamp";
//!     fn id(&self) -> ControlId {
//!         self.0
//!     }
//! }
//!
//! let mut lamps = Registry::new();
//! lamps.insert(Lamp(ControlId::new(2)));
//!
//! assert!(lamps.get(ControlId::new(2)).is_some());
//! assert!(lamps.get(ControlId::new(7)).is_none());
//! ```

use crate::error::{HardwareError, Result};
use controld_core::ControlId;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to a control object; the mutex serializes all access.
pub type Shared<T> = Arc<Mutex<T>>;

/// Identity of a hardware-facing object.
pub trait Control: Send + 'static {
    /// Human-readable kind, used in logs and lock errors.
    const KIND: &'static str;

    /// Id of this instance, unique among objects of the same type.
    fn id(&self) -> ControlId;

    fn kind(&self) -> &'static str {
        Self::KIND
    }
}

/// Wrap a control object in its shared, lockable handle.
pub fn share<T: Control>(object: T) -> Shared<T> {
    Arc::new(Mutex::new(object))
}

/// Take the exclusive lock of a control object.
///
/// # Errors
///
/// Returns [`HardwareError::LockPoisoned`] if a previous holder panicked.
pub fn lock<T: Control>(shared: &Shared<T>) -> Result<MutexGuard<'_, T>> {
    shared
        .lock()
        .map_err(|_| HardwareError::lock_poisoned(T::KIND))
}

/// Id -> instance lookup for one concrete control type.
///
/// Populated single-threaded while the board is built, then only read.
#[derive(Debug)]
pub struct Registry<T> {
    entries: BTreeMap<ControlId, Shared<T>>,
}

impl<T: Control> Registry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register an instance under its own id.
    ///
    /// Returns the shared handle and the instance previously registered under
    /// the same id, if any.
    pub fn insert(&mut self, object: T) -> (Shared<T>, Option<Shared<T>>) {
        let id = object.id();
        let shared = share(object);
        let previous = self.entries.insert(id, Arc::clone(&shared));
        (shared, previous)
    }

    /// Look up an instance by id.
    #[must_use]
    pub fn get(&self, id: ControlId) -> Option<Shared<T>> {
        self.entries.get(&id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: ControlId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Registered ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ControlId> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ControlId, &Shared<T>)> {
        self.entries.iter().map(|(id, shared)| (*id, shared))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Control> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
