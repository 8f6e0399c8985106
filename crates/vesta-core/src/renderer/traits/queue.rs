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


use crate::renderer::api::{PresentStatus, QueueType, SyncPoint, WaitStatus};
use crate::renderer::error::GpuError;
use crate::renderer::traits::{CommandBuffer, CompletionCounter, Swapchain};
use std::time::Duration;

/// A submission endpoint wrapping one native hardware queue.
///
/// A queue is `Send` but not `Sync`: it is used by one OS thread at a time.
/// The async compute worker enforces this by taking ownership of it.
pub trait Queue: Send + 'static {
    /// The command buffer type this queue executes.
    type CommandBuffer: CommandBuffer;
    /// The counter type this queue signals and waits on.
    type CompletionCounter: CompletionCounter;
    /// The swapchain type this queue presents.
    type Swapchain: Swapchain;

    /// The kind of hardware queue.
    fn queue_type(&self) -> QueueType;

    /// Executes `command_buffers` in array order, then signals every counter
    /// of `signal_counters` with its next sync point.
    ///
    /// Signalling is enqueued after the command lists; completion is observed
    /// asynchronously through the counters. Every submitted buffer moves to
    /// [`CommandBufferState::Pending`](crate::renderer::CommandBufferState::Pending).
    ///
    /// Backends that need the swapchain's "image acquired" wait before the
    /// frame's commands may run apply it implicitly when `swapchain` is given.
    ///
    /// ## Errors
    /// * `GpuError::SubmissionFailed` - If a buffer is not executable or the driver rejects the submission.
    /// * `GpuError::DeviceLost` - If the device was lost.
    fn submit(
        &mut self,
        command_buffers: &mut [&mut Self::CommandBuffer],
        signal_counters: &[&Self::CompletionCounter],
        swapchain: Option<&mut Self::Swapchain>,
    ) -> Result<(), GpuError>;

    /// Queues the current swapchain image for display, advances the image index
    /// and signals every counter of `signal_counters`.
    ///
    /// An out-of-date swapchain is not an error: the frame is dropped and
    /// [`PresentStatus::OutOfDate`] is returned so the owner can resize.
    fn present(
        &mut self,
        swapchain: &mut Self::Swapchain,
        signal_counters: &[&Self::CompletionCounter],
    ) -> Result<PresentStatus, GpuError>;

    /// Makes the GPU wait until `counter` reaches `value` before executing
    /// anything submitted afterwards. Does not block the calling thread.
    fn wait(&mut self, counter: &Self::CompletionCounter, value: SyncPoint)
        -> Result<(), GpuError>;

    /// Enqueues a signal of `counter` and returns the sync point it will reach.
    fn signal(&mut self, counter: &Self::CompletionCounter) -> Result<SyncPoint, GpuError>;

    /// Blocks the calling thread until everything submitted to this queue has
    /// finished executing, or `timeout` elapses.
    fn wait_idle(&mut self, timeout: Duration) -> Result<WaitStatus, GpuError>;
}
