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


//! Defines the capability interfaces every graphics backend implements.
//!
//! This module contains the contracts that decouple the submission engine from
//! any specific native API. A backend provides one concrete type per role and
//! ties them together through the associated types of [`GraphicsDevice`], so the
//! engine never needs to downcast a trait object to reach backend state.
//!
//! - [`GraphicsDevice`]: The factory for every other role.
//! - [`Queue`]: The point where recorded command lists reach the GPU.
//! - [`CompletionCounter`]: A monotonically increasing GPU timeline.
//! - [`CommandBuffer`]: A recyclable [`RecordingContext`] for GPU commands.
//! - [`Swapchain`]: The rotating set of images consumed by the display.
//! - [`DescriptorHeap`]: Native storage for shader-binding-table entries.

mod command_buffer;
mod completion_counter;
mod descriptor_heap;
mod graphics_device;
mod queue;
mod swapchain;

pub use self::command_buffer::{CommandBuffer, RecordingContext};
pub use self::completion_counter::CompletionCounter;
pub use self::descriptor_heap::DescriptorHeap;
pub use self::graphics_device::GraphicsDevice;
pub use self::queue::Queue;
pub use self::swapchain::Swapchain;
