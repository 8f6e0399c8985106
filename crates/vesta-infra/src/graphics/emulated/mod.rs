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


//! An emulated backend family running the GPU timeline on a CPU thread.
//!
//! Each [`EmulatedVariant`] reproduces the queue semantics of one native API
//! family, quirks included, so the submission engine can be exercised headless
//! and deterministically. Command lists recorded into an
//! [`EmulatedCommandBuffer`] are executed later by the timeline thread, which
//! also checks that their backing memory was not reset in the meantime.

mod command;
mod counter;
mod descriptor;
mod device;
mod queue;
mod swapchain;
mod timeline;

pub use self::command::{EmulatedCommand, EmulatedCommandBuffer};
pub use self::counter::EmulatedCounter;
pub use self::descriptor::EmulatedDescriptorHeap;
pub use self::device::EmulatedDevice;
pub use self::queue::EmulatedQueue;
pub use self::swapchain::EmulatedSwapchain;
pub use self::timeline::EmulatedStats;

use serde::{Deserialize, Serialize};
use vesta_core::renderer::GraphicsBackendType;

/// The native API family an [`EmulatedDevice`] reproduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmulatedVariant {
    /// An immediate single-context desktop API (D3D11): work executes on the
    /// submitting thread and is complete when `submit` returns.
    Immediate,
    /// A descriptor-heap / command-list desktop API (D3D12): a GPU queue
    /// executes command lists asynchronously and signals fences.
    DescriptorHeap,
    /// An explicit cross-platform API with timeline semaphores (Vulkan): like
    /// `DescriptorHeap`, and a submission that renders to the swapchain must
    /// wait for the acquired image.
    ExplicitTimeline,
    /// A legacy immediate-mode API (OpenGL): single context, inline execution.
    Legacy,
}

impl EmulatedVariant {
    /// All variants, in declaration order.
    pub const ALL: [EmulatedVariant; 4] = [
        EmulatedVariant::Immediate,
        EmulatedVariant::DescriptorHeap,
        EmulatedVariant::ExplicitTimeline,
        EmulatedVariant::Legacy,
    ];

    /// The native API this variant stands for.
    pub fn backend_type(self) -> GraphicsBackendType {
        match self {
            EmulatedVariant::Immediate => GraphicsBackendType::Dx11,
            EmulatedVariant::DescriptorHeap => GraphicsBackendType::Dx12,
            EmulatedVariant::ExplicitTimeline => GraphicsBackendType::Vulkan,
            EmulatedVariant::Legacy => GraphicsBackendType::OpenGL,
        }
    }

    /// The variant emulating `backend_type`, if any.
    pub fn from_backend_type(backend_type: GraphicsBackendType) -> Option<Self> {
        match backend_type {
            GraphicsBackendType::Dx11 => Some(EmulatedVariant::Immediate),
            GraphicsBackendType::Dx12 => Some(EmulatedVariant::DescriptorHeap),
            GraphicsBackendType::Vulkan => Some(EmulatedVariant::ExplicitTimeline),
            GraphicsBackendType::OpenGL => Some(EmulatedVariant::Legacy),
            _ => None,
        }
    }

    /// Returns `true` if submitted work executes on the submitting thread.
    pub fn executes_inline(self) -> bool {
        self.backend_type().is_immediate()
    }

    /// Returns `true` if a submission targeting the swapchain must wait for
    /// the image acquired by `prepare_next_frame`.
    pub fn requires_acquired_image(self) -> bool {
        matches!(self, EmulatedVariant::ExplicitTimeline)
    }
}

/// Configuration for an [`EmulatedDevice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatedConfig {
    /// The variant to emulate. `None` lets backend selection derive it from
    /// the preferred backend order; a device created directly with `None`
    /// emulates [`EmulatedVariant::DescriptorHeap`].
    pub variant: Option<EmulatedVariant>,
    /// Simulated GPU time spent per recorded command, in microseconds.
    pub command_latency_us: u64,
    /// Number of images of the swapchains created by the device.
    pub swapchain_images: u32,
}

impl Default for EmulatedConfig {
    fn default() -> Self {
        Self {
            variant: None,
            command_latency_us: 0,
            swapchain_images: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_map_to_their_native_api() {
        for variant in EmulatedVariant::ALL {
            assert_eq!(
                EmulatedVariant::from_backend_type(variant.backend_type()),
                Some(variant)
            );
        }
        assert_eq!(EmulatedVariant::from_backend_type(GraphicsBackendType::Metal), None);
        assert!(EmulatedVariant::Immediate.executes_inline());
        assert!(EmulatedVariant::Legacy.executes_inline());
        assert!(!EmulatedVariant::DescriptorHeap.executes_inline());
        assert!(EmulatedVariant::ExplicitTimeline.requires_acquired_image());
    }
}
