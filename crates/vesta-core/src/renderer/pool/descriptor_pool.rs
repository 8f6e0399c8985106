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


use crate::renderer::api::{
    DescriptorBlock, DescriptorEntry, DescriptorHeapDescriptor, DescriptorHeapKind,
    DescriptorRange, Handle, SyncPoint,
};
use crate::renderer::async_compute::SubmissionListener;
use crate::renderer::error::GpuError;
use crate::renderer::traits::{DescriptorHeap, GraphicsDevice};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Configuration for a [`DescriptorPool`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorPoolConfig {
    /// Debug label of the pool, also used to name its heaps.
    pub label: String,
    /// The family of descriptors the pool hands out.
    pub kind: DescriptorHeapKind,
    /// The number of descriptors in each block. One allocation never spans
    /// two blocks, so this also bounds the size of a single allocation.
    pub descriptors_per_block: u32,
    /// Whether the block heaps are visible to shaders.
    pub shader_visible: bool,
}

impl Default for DescriptorPoolConfig {
    fn default() -> Self {
        Self {
            label: "DescriptorPool".to_string(),
            kind: DescriptorHeapKind::ResourceView,
            descriptors_per_block: 1024,
            shader_visible: true,
        }
    }
}

struct BlockSlot<H> {
    heap: H,
    generation: u32,
    cursor: u32,
}

struct PoolState<H> {
    blocks: Vec<BlockSlot<H>>,
    active: Option<u32>,
    /// Blocks filled up since the last retirement. Their ranges may still be
    /// recorded into the submission after the one that retires them.
    exhausted: Vec<u32>,
    /// Full blocks waiting for the GPU to reach the tagged sync point.
    pending: VecDeque<(SyncPoint, u32)>,
    free: Vec<u32>,
}

/// A bump allocator over fixed-size blocks of descriptor memory.
///
/// Allocation advances a cursor in the active block and never calls the driver
/// unless a new block is needed. Blocks are recycled as whole units: a full block
/// is [`retire`](Self::retire)d when a submission goes out and returns to the
/// free list once [`recycle`](Self::recycle) sees its tag reached. Individual
/// ranges are never freed.
///
/// A retired block is tagged with the sync point *after* the retiring
/// submission. Allocation may happen on any thread, so a block that filled up
/// while submission `N` was being handed to the queue can still hold ranges
/// recorded into `N + 1`. A range must be recorded into the first submission
/// that follows its allocation.
///
/// One coarse lock guards the pool, held for a single call.
pub struct DescriptorPool<D: GraphicsDevice> {
    device: Arc<D>,
    config: DescriptorPoolConfig,
    state: Mutex<PoolState<D::DescriptorHeap>>,
}

impl<D: GraphicsDevice> DescriptorPool<D> {
    /// Creates an empty pool. No heap is allocated before the first allocation.
    ///
    /// ## Errors
    /// * `GpuError::AllocationFailed` - If the configured block size is zero.
    pub fn new(device: Arc<D>, config: DescriptorPoolConfig) -> Result<Self, GpuError> {
        if config.descriptors_per_block == 0 {
            return Err(GpuError::AllocationFailed(format!(
                "{}: blocks must hold at least one descriptor",
                config.label
            )));
        }
        Ok(Self {
            device,
            config,
            state: Mutex::new(PoolState {
                blocks: Vec::new(),
                active: None,
                exhausted: Vec::new(),
                pending: VecDeque::new(),
                free: Vec::new(),
            }),
        })
    }

    /// The configuration the pool was created with.
    pub fn config(&self) -> &DescriptorPoolConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<D::DescriptorHeap>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocates `count` contiguous descriptors.
    ///
    /// ## Errors
    /// * `GpuError::AllocationFailed` - If `count` is zero or larger than a block,
    ///   or if the device fails to create a new heap.
    pub fn allocate(&self, count: u32) -> Result<DescriptorRange, GpuError> {
        let capacity = self.config.descriptors_per_block;
        if count == 0 || count > capacity {
            return Err(GpuError::AllocationFailed(format!(
                "{}: cannot allocate {count} descriptors from blocks of {capacity}",
                self.config.label
            )));
        }

        let mut state = self.lock();

        if let Some(index) = state.active {
            let block = &mut state.blocks[index as usize];
            if capacity - block.cursor >= count {
                let first = block.cursor;
                block.cursor += count;
                return Ok(DescriptorRange {
                    block: Handle::new(index, block.generation),
                    first,
                    count,
                });
            }
            state.exhausted.push(index);
            state.active = None;
        }

        let index = match state.free.pop() {
            Some(index) => {
                state.blocks[index as usize].cursor = 0;
                index
            }
            None => {
                let index = state.blocks.len() as u32;
                let label = format!("{} Heap {index}", self.config.label);
                let heap = self.device.create_descriptor_heap(&DescriptorHeapDescriptor {
                    label: Some(Cow::Owned(label)),
                    kind: self.config.kind,
                    capacity,
                    shader_visible: self.config.shader_visible,
                })?;
                log::debug!(
                    "{}: created block {index} ({capacity} {:?} descriptors)",
                    self.config.label,
                    self.config.kind
                );
                state.blocks.push(BlockSlot {
                    heap,
                    generation: 0,
                    cursor: 0,
                });
                index
            }
        };

        state.active = Some(index);
        let block = &mut state.blocks[index as usize];
        block.cursor = count;
        Ok(DescriptorRange {
            block: Handle::new(index, block.generation),
            first: 0,
            count,
        })
    }

    /// Writes `entry` as the `offset`-th descriptor of `range`.
    ///
    /// ## Errors
    /// * `GpuError::InvalidHandle` - If the block behind `range` was recycled,
    ///   whether or not it has been handed out again.
    /// * `GpuError::AllocationFailed` - If `offset` is outside the range.
    pub fn write(
        &self,
        range: &DescriptorRange,
        offset: u32,
        entry: DescriptorEntry,
    ) -> Result<(), GpuError> {
        let mut state = self.lock();
        let block = state
            .blocks
            .get_mut(range.block.index() as usize)
            .filter(|block| block.generation == range.block.generation())
            .ok_or(GpuError::InvalidHandle)?;
        let slot = range.slot(offset).ok_or_else(|| {
            GpuError::AllocationFailed(format!(
                "descriptor {offset} is outside a range of {}",
                range.count
            ))
        })?;
        block.heap.write(slot, entry)
    }

    /// Returns `true` if `block` still designates the block it was issued for.
    pub fn is_current(&self, block: Handle<DescriptorBlock>) -> bool {
        self.lock()
            .blocks
            .get(block.index() as usize)
            .is_some_and(|slot| slot.generation == block.generation())
    }

    /// Retires every block exhausted since the previous call, as `submitted`
    /// goes out.
    ///
    /// The blocks are tagged with `submitted.next()`: a block that filled up
    /// after `submitted` was recorded may still be bound by the submission that
    /// follows it. The active block keeps serving allocations.
    pub fn retire(&self, submitted: SyncPoint) {
        let tag = submitted.next();
        let mut state = self.lock();
        let exhausted = std::mem::take(&mut state.exhausted);
        state
            .pending
            .extend(exhausted.into_iter().map(|index| (tag, index)));
    }

    /// Returns every retired block whose sync point is reached by `completed`
    /// to the free list. Returns the number of recycled blocks.
    pub fn recycle(&self, completed: SyncPoint) -> usize {
        let mut state = self.lock();
        let mut recycled = 0;
        while let Some(&(sync_point, index)) = state.pending.front() {
            if !sync_point.is_reached_by(completed) {
                break;
            }
            state.pending.pop_front();
            // Ranges handed out from the block are stale from here on.
            let block = &mut state.blocks[index as usize];
            block.generation = block.generation.wrapping_add(1);
            state.free.push(index);
            recycled += 1;
        }
        if recycled > 0 {
            log::trace!(
                "{}: recycled {recycled} blocks at {completed}",
                self.config.label
            );
        }
        recycled
    }

    /// The number of heaps created so far.
    pub fn block_count(&self) -> usize {
        self.lock().blocks.len()
    }

    /// The number of blocks ready to be reused.
    pub fn free_block_count(&self) -> usize {
        self.lock().free.len()
    }

    /// The number of retired blocks still waiting for the GPU.
    pub fn pending_block_count(&self) -> usize {
        self.lock().pending.len()
    }
}

impl<D: GraphicsDevice> SubmissionListener for DescriptorPool<D> {
    fn on_submitted(&self, submitted: SyncPoint, completed: SyncPoint) {
        self.retire(submitted);
        self.recycle(completed);
    }
}

impl<D: GraphicsDevice> std::fmt::Debug for DescriptorPool<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorPool")
            .field("config", &self.config)
            .field("blocks", &self.block_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::{BufferId, SamplerId};
    use crate::renderer::test_support::ManualDevice;

    fn pool(block: u32) -> (Arc<ManualDevice>, DescriptorPool<ManualDevice>) {
        let device = Arc::new(ManualDevice::new());
        let pool = DescriptorPool::new(
            device.clone(),
            DescriptorPoolConfig {
                descriptors_per_block: block,
                ..Default::default()
            },
        )
        .unwrap();
        (device, pool)
    }

    fn buffer(id: usize) -> DescriptorEntry {
        DescriptorEntry::Buffer {
            buffer: BufferId(id),
            offset: 0,
            size: None,
        }
    }

    #[test]
    fn allocations_bump_within_a_block() {
        let (device, pool) = pool(8);

        let a = pool.allocate(3).unwrap();
        let b = pool.allocate(5).unwrap();
        assert_eq!((a.first, a.count), (0, 3));
        assert_eq!((b.first, b.count), (3, 5));
        assert_eq!(a.block, b.block);
        assert_eq!(device.stats().heaps_created(), 1);
    }

    #[test]
    fn full_block_is_replaced_as_a_whole() {
        let (device, pool) = pool(8);

        let a = pool.allocate(6).unwrap();
        let b = pool.allocate(4).unwrap();
        assert_ne!(a.block.index(), b.block.index());
        assert_eq!(b.first, 0);
        assert_eq!(device.stats().heaps_created(), 2);
    }

    #[test]
    fn oversized_or_empty_allocation_fails() {
        let (_device, pool) = pool(8);
        assert!(matches!(
            pool.allocate(9),
            Err(GpuError::AllocationFailed(_))
        ));
        assert!(matches!(
            pool.allocate(0),
            Err(GpuError::AllocationFailed(_))
        ));
        assert_eq!(pool.block_count(), 0);
    }

    #[test]
    fn retired_blocks_wait_for_the_following_sync_point() {
        let (device, pool) = pool(4);

        let first = pool.allocate(4).unwrap();
        pool.allocate(4).unwrap(); // exhausts the first block
        pool.retire(SyncPoint(3));
        assert_eq!(pool.pending_block_count(), 1);

        assert_eq!(pool.recycle(SyncPoint(3)), 0);
        pool.allocate(4).unwrap();
        assert_eq!(device.stats().heaps_created(), 3);

        assert_eq!(pool.recycle(SyncPoint(4)), 1);
        assert!(!pool.is_current(first.block));
        let reused = pool.allocate(4).unwrap();
        assert_eq!(reused.block.index(), first.block.index());
        assert_eq!(device.stats().heaps_created(), 3);
    }

    #[test]
    fn block_filled_during_a_submission_outlives_the_next_one() {
        let (_device, pool) = pool(2);

        // Submission #1 records a range from the first block.
        let recorded = pool.allocate(2).unwrap();
        // Another thread fills the block while #1 is handed to the queue; its
        // range will be recorded into #2.
        let late = pool.allocate(2).unwrap();
        pool.on_submitted(SyncPoint(1), SyncPoint(0));
        assert_ne!(late.block.index(), recorded.block.index());

        // #1 completing does not free the block: #2 may still read it.
        pool.on_submitted(SyncPoint(2), SyncPoint(1));
        assert!(pool.is_current(recorded.block));
        assert_eq!(pool.free_block_count(), 0);

        pool.on_submitted(SyncPoint(3), SyncPoint(2));
        assert!(!pool.is_current(recorded.block));
        assert_eq!(pool.free_block_count(), 1);
    }

    #[test]
    fn write_rejects_stale_ranges() {
        let (_device, pool) = pool(2);

        let stale = pool.allocate(2).unwrap();
        pool.write(&stale, 1, buffer(7)).unwrap();

        pool.allocate(2).unwrap();
        pool.retire(SyncPoint(1));
        pool.recycle(SyncPoint(2));
        // Stale as soon as it is recycled, before the block is handed out again.
        assert_eq!(pool.write(&stale, 1, buffer(7)), Err(GpuError::InvalidHandle));

        let fresh = pool.allocate(2).unwrap();
        assert_eq!(fresh.block.index(), stale.block.index());

        assert_eq!(pool.write(&stale, 0, buffer(1)), Err(GpuError::InvalidHandle));
        pool.write(&fresh, 0, buffer(1)).unwrap();
        assert!(matches!(
            pool.write(&fresh, 2, buffer(1)),
            Err(GpuError::AllocationFailed(_))
        ));
    }

    #[test]
    fn write_enforces_heap_kind() {
        let (_device, pool) = pool(4);
        let range = pool.allocate(1).unwrap();
        assert!(matches!(
            pool.write(&range, 0, DescriptorEntry::Sampler(SamplerId(0))),
            Err(GpuError::Backend(_))
        ));
    }

    #[test]
    fn listener_retires_and_recycles() {
        let (_device, pool) = pool(1);
        pool.allocate(1).unwrap();
        pool.allocate(1).unwrap();

        pool.on_submitted(SyncPoint(1), SyncPoint(0));
        assert_eq!(pool.pending_block_count(), 1);
        pool.on_submitted(SyncPoint(2), SyncPoint(1));
        assert_eq!(pool.pending_block_count(), 1);
        pool.on_submitted(SyncPoint(3), SyncPoint(2));
        assert_eq!(pool.pending_block_count(), 0);
        assert_eq!(pool.free_block_count(), 1);
    }
}
