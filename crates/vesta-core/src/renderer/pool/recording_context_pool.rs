// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::renderer::api::{Handle, SyncPoint};
use crate::renderer::error::GpuError;
use crate::renderer::traits::RecordingContext;
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

struct ContextSlot<C> {
    generation: u32,
    /// `None` while the context is lent out, or after it was released.
    context: Option<C>,
}

/// A recording context lent out by a [`RecordingContextPool`].
///
/// The holder owns the context exclusively until it gives it back through
/// [`RecordingContextPool::discard`] or [`RecordingContextPool::release`].
pub struct PooledContext<C> {
    handle: Handle<C>,
    recycled: bool,
    context: C,
}

impl<C> PooledContext<C> {
    /// The generation-checked handle of the slot this context lives in.
    pub fn handle(&self) -> Handle<C> {
        self.handle
    }

    /// `true` if the context was reset and reused rather than newly created.
    pub fn was_recycled(&self) -> bool {
        self.recycled
    }
}

impl<C> Deref for PooledContext<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.context
    }
}

impl<C> DerefMut for PooledContext<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.context
    }
}

impl<C> std::fmt::Debug for PooledContext<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledContext")
            .field("handle", &self.handle)
            .field("recycled", &self.recycled)
            .finish_non_exhaustive()
    }
}

/// A pool of recording contexts recycled in submission order.
///
/// Contexts handed back with [`discard`](Self::discard) wait in a FIFO tagged
/// with the sync point of the submission that used them. A request only looks
/// at the oldest entry: if the GPU has reached its sync point, that context is
/// reset and reused, otherwise a new one is created. The pool therefore grows
/// while the GPU lags behind instead of stalling the caller.
///
/// Dropping the pool leaks the contexts still waiting for their sync point.
pub struct RecordingContextPool<C: RecordingContext> {
    label: String,
    slots: Vec<ContextSlot<C>>,
    pending: VecDeque<(SyncPoint, u32)>,
    vacant: Vec<u32>,
    created: usize,
    recycled: usize,
}

impl<C: RecordingContext> RecordingContextPool<C> {
    /// Creates an empty pool. `label` prefixes the debug names of new contexts.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            slots: Vec::new(),
            pending: VecDeque::new(),
            vacant: Vec::new(),
            created: 0,
            recycled: 0,
        }
    }

    /// Hands out a context that is safe to record into.
    ///
    /// ## Arguments
    /// * `completed` - The current completion value of the counter the pooled
    ///   contexts were submitted against.
    /// * `create` - Builds a new context when none can be recycled. It receives
    ///   the debug name for the new context (`"<label> N"`).
    ///
    /// ## Errors
    /// Propagates errors from `create` and from [`RecordingContext::reset`].
    pub fn request<F>(
        &mut self,
        completed: SyncPoint,
        create: F,
    ) -> Result<PooledContext<C>, GpuError>
    where
        F: FnOnce(&str) -> Result<C, GpuError>,
    {
        if let Some(&(sync_point, index)) = self.pending.front() {
            if sync_point.is_reached_by(completed) {
                self.pending.pop_front();
                let slot = &mut self.slots[index as usize];
                if let Some(mut context) = slot.context.take() {
                    slot.generation = slot.generation.wrapping_add(1);
                    if let Err(e) = context.reset() {
                        drop(context);
                        self.vacant.push(index);
                        return Err(e);
                    }
                    self.recycled += 1;
                    log::trace!(
                        "{}: recycled context {index} (completed {completed} >= {sync_point})",
                        self.label
                    );
                    return Ok(PooledContext {
                        handle: Handle::new(index, slot.generation),
                        recycled: true,
                        context,
                    });
                }
            }
        }

        let name = format!("{} {}", self.label, self.created);
        let context = create(&name)?;
        self.created += 1;

        let handle = match self.vacant.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                Handle::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(ContextSlot {
                    generation: 0,
                    context: None,
                });
                Handle::new(index, 0)
            }
        };
        log::debug!("{}: created context '{name}' as {handle:?}", self.label);

        Ok(PooledContext {
            handle,
            recycled: false,
            context,
        })
    }

    /// Gives a submitted context back to the pool.
    ///
    /// It will not be handed out again before a completion value of at least
    /// `sync_point` is passed to [`request`](Self::request).
    ///
    /// # Panics
    /// If `context` was not lent out by this pool, or was already given back.
    pub fn discard(&mut self, sync_point: SyncPoint, context: PooledContext<C>) {
        let index = self.check_out(&context);
        self.slots[index as usize].context = Some(context.context);
        self.pending.push_back((sync_point, index));
    }

    /// Destroys a lent-out context instead of returning it to the pool.
    ///
    /// # Panics
    /// If `context` was not lent out by this pool, or was already given back.
    pub fn release(&mut self, context: PooledContext<C>) {
        let index = self.check_out(&context);
        drop(context);
        self.vacate(index);
    }

    fn vacate(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(index);
    }

    fn check_out(&self, context: &PooledContext<C>) -> u32 {
        let index = context.handle.index();
        let slot = self.slots.get(index as usize);
        assert!(
            slot.is_some_and(|slot| slot.generation == context.handle.generation()
                && slot.context.is_none()),
            "{}: {:?} does not belong to this pool",
            self.label,
            context.handle
        );
        index
    }

    /// Returns `true` if `handle` still designates the context it was issued for.
    pub fn is_current(&self, handle: Handle<C>) -> bool {
        self.slots
            .get(handle.index() as usize)
            .is_some_and(|slot| slot.generation == handle.generation())
    }

    /// Drops every context waiting in the pool and returns how many were dropped.
    ///
    /// Contexts currently lent out are not affected.
    ///
    /// Only call this once the GPU can no longer read any submitted context,
    /// e.g. after the device was lost. Otherwise use
    /// [`release_reached`](Self::release_reached).
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        while let Some((_, index)) = self.pending.pop_front() {
            if self.slots[index as usize].context.take().is_some() {
                released += 1;
                self.vacate(index);
            }
        }
        if released > 0 {
            log::debug!("{}: released {released} pooled contexts", self.label);
        }
        released
    }

    /// Drops the pooled contexts whose sync point is reached by `completed`
    /// and returns how many were dropped.
    pub fn release_reached(&mut self, completed: SyncPoint) -> usize {
        let mut released = 0;
        while let Some(&(sync_point, index)) = self.pending.front() {
            if !sync_point.is_reached_by(completed) {
                break;
            }
            self.pending.pop_front();
            if self.slots[index as usize].context.take().is_some() {
                released += 1;
                self.vacate(index);
            }
        }
        released
    }

    /// Leaks every context still waiting for its sync point and returns how
    /// many were leaked.
    ///
    /// The GPU may still execute them, so their native memory is never freed.
    pub fn forget_pending(&mut self) -> usize {
        let mut leaked = 0;
        while let Some((_, index)) = self.pending.pop_front() {
            if let Some(context) = self.slots[index as usize].context.take() {
                std::mem::forget(context);
                leaked += 1;
                self.vacate(index);
            }
        }
        leaked
    }

    /// The number of contexts waiting for their sync point.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The total number of contexts ever created by this pool.
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// The number of times a context was reset and handed out again.
    pub fn recycled_count(&self) -> usize {
        self.recycled
    }
}

impl<C: RecordingContext> Drop for RecordingContextPool<C> {
    fn drop(&mut self) {
        let leaked = self.forget_pending();
        if leaked > 0 {
            log::warn!(
                "{}: dropped with {leaked} contexts still pending, leaking them.",
                self.label
            );
        }
    }
}

impl<C: RecordingContext> std::fmt::Debug for RecordingContextPool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingContextPool")
            .field("label", &self.label)
            .field("slots", &self.slots.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}
