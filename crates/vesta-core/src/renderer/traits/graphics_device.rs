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


use crate::renderer::api::{DescriptorHeapDescriptor, GraphicsAdapterInfo, QueueType};
use crate::renderer::error::GpuError;
use crate::renderer::traits::{CommandBuffer, CompletionCounter, DescriptorHeap, Queue, Swapchain};
use std::fmt::Debug;

/// The factory of one backend family.
///
/// Each backend picks its concrete types once, through the associated types
/// below; everything that flows between roles (a command buffer submitted to a
/// queue, a counter signaled by it) is therefore statically of the right type.
///
/// Swapchains are not created here: they need a native window, which is owned
/// by an external collaborator. Backends expose their own constructor for them.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// The backend's command buffer type.
    type CommandBuffer: CommandBuffer;
    /// The backend's completion counter type.
    type CompletionCounter: CompletionCounter;
    /// The backend's swapchain type.
    type Swapchain: Swapchain;
    /// The backend's descriptor heap type.
    type DescriptorHeap: DescriptorHeap;
    /// The backend's queue type, bound to the types above.
    type Queue: Queue<
        CommandBuffer = Self::CommandBuffer,
        CompletionCounter = Self::CompletionCounter,
        Swapchain = Self::Swapchain,
    >;

    /// Gets information about the adapter the device was created from.
    fn adapter_info(&self) -> GraphicsAdapterInfo;

    /// Creates a queue wrapping a native hardware queue of the given type.
    /// ## Errors
    /// * `GpuError::Backend` - If the device has no queue of that type.
    fn create_queue(&self, queue_type: QueueType) -> Result<Self::Queue, GpuError>;

    /// Creates a command buffer in the `Initial` state.
    /// ## Arguments
    /// * `label` - An optional debug label.
    /// ## Errors
    /// * `GpuError::AllocationFailed` - If the native command memory cannot be allocated.
    fn create_command_buffer(&self, label: Option<&str>) -> Result<Self::CommandBuffer, GpuError>;

    /// Creates a completion counter whose sync point and completion value are both zero.
    fn create_completion_counter(
        &self,
        label: Option<&str>,
    ) -> Result<Self::CompletionCounter, GpuError>;

    /// Creates a descriptor heap.
    /// ## Arguments
    /// * `descriptor` - The kind, capacity and visibility of the heap.
    /// ## Errors
    /// * `GpuError::AllocationFailed` - If the native heap cannot be allocated.
    fn create_descriptor_heap(
        &self,
        descriptor: &DescriptorHeapDescriptor,
    ) -> Result<Self::DescriptorHeap, GpuError>;
}
