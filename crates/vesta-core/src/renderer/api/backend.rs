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


use super::common::{GraphicsAdapterInfo, GraphicsBackendType};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which family of implementations drives the selected native API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendDriver {
    /// Real GPU access through `wgpu`.
    #[default]
    Wgpu,
    /// The CPU-emulated timeline reproducing the native API's queue semantics.
    /// Used for headless runs and tests.
    Emulated,
}

/// Configuration for backend selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSelectionConfig {
    /// Which implementation family to instantiate.
    pub driver: BackendDriver,
    /// Preferred backends in order of preference
    pub preferred_backends: Vec<GraphicsBackendType>,
    /// Maximum time to spend on backend selection, in milliseconds.
    pub timeout_ms: u64,
    /// Whether to prefer discrete GPUs over integrated ones
    pub prefer_discrete_gpu: bool,
}

impl BackendSelectionConfig {
    /// The selection timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for BackendSelectionConfig {
    fn default() -> Self {
        Self {
            driver: BackendDriver::default(),
            preferred_backends: {
                #[cfg(target_os = "windows")]
                {
                    vec![
                        GraphicsBackendType::Vulkan,
                        GraphicsBackendType::Dx12,
                        GraphicsBackendType::Dx11,
                        GraphicsBackendType::OpenGL,
                    ]
                }
                #[cfg(target_os = "macos")]
                {
                    vec![GraphicsBackendType::Metal, GraphicsBackendType::OpenGL]
                }
                #[cfg(target_os = "linux")]
                {
                    vec![GraphicsBackendType::Vulkan, GraphicsBackendType::OpenGL]
                }
                #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
                {
                    vec![GraphicsBackendType::OpenGL]
                }
            },
            timeout_ms: 5_000,
            prefer_discrete_gpu: true,
        }
    }
}

/// Result of a backend selection operation.
#[derive(Debug)]
pub struct BackendSelectionResult<TDevice> {
    /// The device created on the selected adapter.
    pub device: TDevice,
    /// Information about the selected adapter
    pub adapter_info: GraphicsAdapterInfo,
    /// Time taken for the selection process
    pub selection_time_ms: u64,
    /// All backends that were attempted during selection
    pub attempted_backends: Vec<GraphicsBackendType>,
}
