//! Owned resources addressed by opaque handles.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use tracing::debug;

use crate::error::{ApiError, Result};

/// Opaque id of a value held in a [`Registry<T>`].
///
/// Ids start at 1, grow monotonically and are never reused, so a released
/// handle can never alias a later value.
pub struct Handle<T> {
    id: u64,
    marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(id: u64) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }

    /// Numeric id.
    pub fn id(self) -> u64 {
        self.id
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.id)
    }
}

/// Single-owner table of values keyed by [`Handle`].
#[derive(Debug)]
pub struct Registry<T> {
    entries: HashMap<u64, T>,
    next_id: u64,
    kind: &'static str,
}

impl<T> Registry<T> {
    /// Creates an empty registry. `kind` names the values in log lines and errors.
    pub fn new(kind: &'static str) -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
            kind,
        }
    }

    /// Stores `value` and returns its handle.
    pub fn insert(&mut self, value: T) -> Handle<T> {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, value);
        debug!(kind = self.kind, id, "handle created");
        Handle::new(id)
    }

    fn invalid(&self, handle: Handle<T>) -> ApiError {
        ApiError::InvalidHandle {
            kind: self.kind,
            id: handle.id,
        }
    }

    /// Borrows the value behind `handle`.
    pub fn get(&self, handle: Handle<T>) -> Result<&T> {
        self.entries
            .get(&handle.id)
            .ok_or_else(|| self.invalid(handle))
    }

    /// Mutably borrows the value behind `handle`.
    pub fn get_mut(&mut self, handle: Handle<T>) -> Result<&mut T> {
        let invalid = self.invalid(handle);
        self.entries.get_mut(&handle.id).ok_or(invalid)
    }

    /// Removes and returns the value. Releasing twice is an error.
    pub fn release(&mut self, handle: Handle<T>) -> Result<T> {
        match self.entries.remove(&handle.id) {
            Some(value) => {
                debug!(kind = self.kind, id = handle.id, "handle released");
                Ok(value)
            }
            None => Err(self.invalid(handle)),
        }
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no values are live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
