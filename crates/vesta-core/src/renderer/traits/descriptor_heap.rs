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


use crate::renderer::api::{DescriptorEntry, DescriptorHeapKind};
use crate::renderer::error::GpuError;
use std::fmt::Debug;

/// A fixed-capacity native heap of descriptors.
///
/// A heap is the backing store of one block of a
/// [`DescriptorPool`](crate::renderer::DescriptorPool). It is never resized or
/// partially freed.
pub trait DescriptorHeap: Send + Debug + 'static {
    /// The family of descriptors the heap stores.
    fn kind(&self) -> DescriptorHeapKind;

    /// The number of descriptor slots in the heap.
    fn capacity(&self) -> u32;

    /// Whether shaders read directly from this heap.
    fn is_shader_visible(&self) -> bool;

    /// Writes `entry` into slot `index`.
    ///
    /// ## Errors
    /// * `GpuError::AllocationFailed` - If `index` is outside the heap.
    /// * `GpuError::Backend` - If the entry does not fit the heap's kind.
    fn write(&mut self, index: u32, entry: DescriptorEntry) -> Result<(), GpuError>;
}
