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


//! The `wgpu` implementation of the graphics contracts.
//!
//! `wgpu` exposes a single queue per device and hides fences, so completion
//! counters are driven by `on_submitted_work_done` callbacks and observed by
//! polling the device.

mod backend;
mod command;
mod context;
mod counter;
mod descriptor;
mod device;
mod queue;
mod swapchain;

pub use self::backend::{backend_name, WgpuBackendSelector};
pub use self::command::WgpuCommandBuffer;
pub use self::context::WgpuGraphicsContext;
pub use self::counter::WgpuCounter;
pub use self::descriptor::WgpuDescriptorHeap;
pub use self::device::WgpuDevice;
pub use self::queue::WgpuQueue;
pub use self::swapchain::WgpuSwapchain;
