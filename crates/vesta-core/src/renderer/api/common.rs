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


//! Provides common, backend-agnostic enums and data structures describing the
//! active graphics backend.

use serde::{Deserialize, Serialize};

/// A backend-agnostic representation of a graphics API.
///
/// The four native families the submission engine is written against are
/// [`Dx11`](Self::Dx11) (immediate single-context), [`Dx12`](Self::Dx12)
/// (descriptor heaps and command lists), [`Vulkan`](Self::Vulkan) (explicit,
/// timeline semaphores) and [`OpenGL`](Self::OpenGL) (legacy immediate mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GraphicsBackendType {
    /// Vulkan API.
    Vulkan,
    /// Apple's Metal API.
    Metal,
    /// Microsoft's DirectX 12 API.
    Dx12,
    /// Microsoft's DirectX 11 API.
    Dx11,
    /// OpenGL API.
    OpenGL,
    /// WebGPU API (for web builds).
    WebGpu,
    /// An unknown or unsupported backend.
    #[default]
    Unknown,
}

impl GraphicsBackendType {
    /// Returns `true` if the API executes recorded commands on an implicit,
    /// driver-managed timeline (no explicit queues on the application side).
    pub fn is_immediate(self) -> bool {
        matches!(self, GraphicsBackendType::Dx11 | GraphicsBackendType::OpenGL)
    }
}

/// The physical type of a graphics device (GPU).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RendererDeviceType {
    /// A GPU integrated into the CPU.
    IntegratedGpu,
    /// A discrete, dedicated GPU.
    DiscreteGpu,
    /// A virtualized or software-based GPU.
    VirtualGpu,
    /// A software renderer running on the CPU.
    Cpu,
    /// An unknown or unsupported device type.
    #[default]
    Unknown,
}

/// Information about the adapter a device was created from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphicsAdapterInfo {
    /// Human-readable adapter name.
    pub name: String,
    /// The native API family driving the adapter.
    pub backend_type: GraphicsBackendType,
    /// The physical type of the adapter.
    pub device_type: RendererDeviceType,
}
