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


//! Graphics backends and the startup-time selection between them.

pub mod emulated;
#[cfg(feature = "graphics")]
pub mod wgpu;

pub use self::emulated::{EmulatedConfig, EmulatedDevice, EmulatedVariant};
#[cfg(feature = "graphics")]
pub use self::wgpu::WgpuDevice;

use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Instant;
use vesta_core::renderer::{
    BackendDriver, BackendSelectionConfig, BackendSelectionResult, GraphicsAdapterInfo,
    GraphicsDevice,
};

/// The backend chosen at startup. Exactly one variant is active per process.
///
/// Code that drives a session matches on this once and continues with the
/// concrete device type, so no call after selection goes through dynamic dispatch.
#[derive(Debug, Clone)]
pub enum ActiveBackend {
    /// A real GPU driven through `wgpu`.
    #[cfg(feature = "graphics")]
    Wgpu(Arc<WgpuDevice>),
    /// One of the emulated native API variants.
    Emulated(Arc<EmulatedDevice>),
}

impl ActiveBackend {
    /// Creates the device described by `config`, trying the preferred backends in order.
    ///
    /// ## Arguments
    /// * `config` - The driver and backend preference order.
    /// * `emulated` - Settings for the emulated driver. Its `variant`, when set,
    ///   overrides the preference order.
    ///
    /// ## Errors
    /// Fails if no preferred backend could be initialized.
    pub fn select(
        config: &BackendSelectionConfig,
        emulated: &EmulatedConfig,
    ) -> Result<BackendSelectionResult<ActiveBackend>> {
        match config.driver {
            #[cfg(feature = "graphics")]
            BackendDriver::Wgpu => {
                let selection = self::wgpu::WgpuBackendSelector::new().select_device(config)?;
                Ok(BackendSelectionResult {
                    device: ActiveBackend::Wgpu(Arc::new(selection.device)),
                    adapter_info: selection.adapter_info,
                    selection_time_ms: selection.selection_time_ms,
                    attempted_backends: selection.attempted_backends,
                })
            }
            #[cfg(not(feature = "graphics"))]
            BackendDriver::Wgpu => Err(anyhow!(
                "The wgpu driver is not available: vesta-infra was built without the `graphics` feature."
            )),
            BackendDriver::Emulated => Self::select_emulated(config, emulated),
        }
    }

    fn select_emulated(
        config: &BackendSelectionConfig,
        emulated: &EmulatedConfig,
    ) -> Result<BackendSelectionResult<ActiveBackend>> {
        let start_time = Instant::now();
        let mut attempted_backends = Vec::new();

        let variant = match emulated.variant {
            Some(variant) => {
                attempted_backends.push(variant.backend_type());
                variant
            }
            None => config
                .preferred_backends
                .iter()
                .find_map(|&backend_type| {
                    attempted_backends.push(backend_type);
                    let variant = EmulatedVariant::from_backend_type(backend_type);
                    if variant.is_none() {
                        log::warn!("No emulated variant for {backend_type:?}, skipping.");
                    }
                    variant
                })
                .ok_or_else(|| {
                    anyhow!("No emulated variant matches the preferred backends {attempted_backends:?}")
                })?,
        };

        let device = EmulatedDevice::new(EmulatedConfig {
            variant: Some(variant),
            ..emulated.clone()
        })?;
        let adapter_info = device.adapter_info();
        log::info!(
            "Selected emulated {:?} backend ({:?}).",
            adapter_info.backend_type,
            variant
        );

        Ok(BackendSelectionResult {
            device: ActiveBackend::Emulated(Arc::new(device)),
            adapter_info,
            selection_time_ms: start_time.elapsed().as_millis() as u64,
            attempted_backends,
        })
    }

    /// Information about the adapter behind the active backend.
    pub fn adapter_info(&self) -> GraphicsAdapterInfo {
        match self {
            #[cfg(feature = "graphics")]
            ActiveBackend::Wgpu(device) => device.adapter_info(),
            ActiveBackend::Emulated(device) => device.adapter_info(),
        }
    }
}
