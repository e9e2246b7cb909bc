// Copyright 2025 Red Hat Inc
//
// SPDX-License-Identifier: Apache-2.0 or BSD-3-Clause

//! Handle-indexed, reference-counted resources.
//!
//! Every object handed out to the guest is an `Arc<T>` carrying a process-wide
//! unique [`HostHandle`]. Cloning the `Arc` acquires a reference and dropping
//! it releases one; the object's `Drop` impl is its destroy step and runs
//! exactly once, after the last reference is gone.
//!
//! A [`Registry`] owns one reference to each of its entries. Lookups hand out
//! additional references, so a caller may keep using an object after it has
//! been removed from the registry.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

/// Opaque identifier of a host object as seen by the guest.
///
/// `0` is never minted and stands for "no object" (`EGL_NO_CONTEXT`, ...).
pub type HostHandle = u32;

static NEXT_HANDLE: AtomicU32 = AtomicU32::new(1);

fn next_handle(counter: &AtomicU32) -> Option<HostHandle> {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
            next.checked_add(1)
        })
        .ok()
}

/// Mints a new handle. Handles are never reused within the process.
///
/// # Panics
///
/// Panics once the handle space is exhausted.
pub fn gen_handle() -> HostHandle {
    match next_handle(&NEXT_HANDLE) {
        Some(handle) => handle,
        None => panic!("host handle space exhausted"),
    }
}

/// An object that can be stored in a [`Registry`].
pub trait Resource: Send + Sync {
    fn handle(&self) -> HostHandle;
}

/// Takes an additional reference on an optional resource.
pub fn acquire<T: ?Sized>(res: Option<&Arc<T>>) -> Option<Arc<T>> {
    res.map(Arc::clone)
}

/// A handle-indexed collection of resources of one kind.
///
/// Entries keep their insertion order, which is what makes the sorted config
/// list observable to the guest.
pub struct Registry<T: ?Sized + Resource> {
    entries: Vec<Arc<T>>,
}

impl<T: ?Sized + Resource> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: ?Sized + Resource> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|res| res.handle()))
            .finish()
    }
}

impl<T: ?Sized + Resource> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds `res`, taking the registry's own reference to it.
    pub fn add(&mut self, res: &Arc<T>) {
        self.entries.push(Arc::clone(res));
    }

    /// Returns a new reference to the resource with the given handle.
    pub fn acquire(&self, handle: HostHandle) -> Option<Arc<T>> {
        self.entries
            .iter()
            .find(|res| res.handle() == handle)
            .map(Arc::clone)
    }

    /// Returns a new reference to the first resource matching `pred`.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Arc<T>> {
        self.entries
            .iter()
            .find(|res| pred(res))
            .map(Arc::clone)
    }

    /// Unlinks the resource with the given handle and hands the registry's
    /// reference back to the caller.
    ///
    /// The returned reference may be the last one, so callers holding a lock
    /// must drop it only after unlocking.
    #[must_use = "dropping the removed reference may destroy the resource"]
    pub fn remove(&mut self, handle: HostHandle) -> Option<Arc<T>> {
        let pos = self.entries.iter().position(|res| res.handle() == handle)?;
        Some(self.entries.remove(pos))
    }

    /// Transfers every entry to `dst` without touching reference counts.
    pub fn move_all(&mut self, dst: &mut Self) {
        dst.entries.append(&mut self.entries);
    }

    /// Returns at most `max` handles in registry order. No references are
    /// taken.
    pub fn handles(&self, max: usize) -> Vec<HostHandle> {
        self.entries
            .iter()
            .take(max)
            .map(|res| res.handle())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.iter()
    }

    /// Releases every entry, first inserted first released.
    pub fn cleanup(&mut self) {
        for res in self.entries.drain(..) {
            drop(res);
        }
    }
}

impl<T: Resource + 'static> Registry<T> {
    /// Like [`Registry::move_all`], but into a list holding mixed kinds.
    pub fn move_all_erased(&mut self, dst: &mut Registry<dyn Resource>) {
        dst.entries
            .extend(self.entries.drain(..).map(|res| res as Arc<dyn Resource>));
    }
}

impl<T: ?Sized + Resource> Drop for Registry<T> {
    fn drop(&mut self) {
        self.cleanup();
    }
}
