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


//! Graphics backend selection with fallback support.
//!
//! Backends are tried in the configured order of preference, each with an
//! instance restricted to that backend, and the first one yielding both an
//! adapter and a logical device wins.

use anyhow::{anyhow, Result};
use std::time::Instant;
use wgpu::{Adapter, Backend, Backends, DeviceType, Instance, RequestAdapterOptions};

use vesta_core::renderer::{
    BackendSelectionConfig, BackendSelectionResult, GraphicsAdapterInfo, GraphicsBackendType,
    RendererDeviceType,
};

use super::context::WgpuGraphicsContext;
use super::device::WgpuDevice;

/// Returns a human-readable name for a backend.
pub fn backend_name(backend: Backend) -> &'static str {
    match backend {
        Backend::Vulkan => "Vulkan",
        Backend::Metal => "Metal",
        Backend::Dx12 => "DirectX 12",
        Backend::Gl => "OpenGL",
        Backend::BrowserWebGpu => "WebGPU",
        Backend::Noop => "No-op",
    }
}

/// Picks the first preferred backend that `wgpu` can bring up on this machine.
#[derive(Debug, Default)]
pub struct WgpuBackendSelector;

impl WgpuBackendSelector {
    /// Create a new WGPU backend selector.
    pub fn new() -> Self {
        Self
    }

    /// Convert WGPU Backend to our generic GraphicsBackendType.
    pub(crate) fn backend_to_type(backend: Backend) -> GraphicsBackendType {
        match backend {
            Backend::Vulkan => GraphicsBackendType::Vulkan,
            Backend::Dx12 => GraphicsBackendType::Dx12,
            Backend::Gl => GraphicsBackendType::OpenGL,
            Backend::Metal => GraphicsBackendType::Metal,
            Backend::BrowserWebGpu => GraphicsBackendType::WebGpu,
            #[allow(unreachable_patterns)]
            _ => GraphicsBackendType::Unknown,
        }
    }

    /// Converts WGPU DeviceType to our generic RendererDeviceType.
    pub(crate) fn device_type_to_type(device_type: DeviceType) -> RendererDeviceType {
        match device_type {
            DeviceType::IntegratedGpu => RendererDeviceType::IntegratedGpu,
            DeviceType::DiscreteGpu => RendererDeviceType::DiscreteGpu,
            DeviceType::VirtualGpu => RendererDeviceType::VirtualGpu,
            DeviceType::Cpu => RendererDeviceType::Cpu,
            _ => RendererDeviceType::Unknown,
        }
    }

    /// Convert our generic GraphicsBackendType to WGPU Backend.
    fn type_to_backend(backend_type: GraphicsBackendType) -> Backend {
        match backend_type {
            GraphicsBackendType::Vulkan => Backend::Vulkan,
            GraphicsBackendType::Dx12 => Backend::Dx12,
            GraphicsBackendType::Dx11 => Backend::Dx12, // Map DX11 to DX12 as WGPU doesn't have DX11
            GraphicsBackendType::OpenGL => Backend::Gl,
            GraphicsBackendType::Metal => Backend::Metal,
            GraphicsBackendType::WebGpu => Backend::BrowserWebGpu,
            GraphicsBackendType::Unknown => Backend::Noop,
        }
    }

    /// The instance backend mask enabling exactly `backend_type`.
    fn type_to_backends(backend_type: GraphicsBackendType) -> Backends {
        match Self::type_to_backend(backend_type) {
            Backend::Vulkan => Backends::VULKAN,
            Backend::Dx12 => Backends::DX12,
            Backend::Gl => Backends::GL,
            Backend::Metal => Backends::METAL,
            Backend::BrowserWebGpu => Backends::BROWSER_WEBGPU,
            _ => Backends::empty(),
        }
    }

    /// Convert WGPU adapter info to our generic GraphicsAdapterInfo.
    pub(crate) fn adapter_to_info(adapter: &Adapter) -> GraphicsAdapterInfo {
        let info = adapter.get_info();
        GraphicsAdapterInfo {
            name: info.name.clone(),
            backend_type: Self::backend_to_type(info.backend),
            device_type: Self::device_type_to_type(info.device_type),
        }
    }

    /// Try to get an adapter for a specific backend type.
    async fn try_backend(
        &self,
        backend_type: GraphicsBackendType,
        config: &BackendSelectionConfig,
    ) -> Result<(Instance, Adapter)> {
        let backend = Self::type_to_backend(backend_type);
        let backends = Self::type_to_backends(backend_type);
        if backends.is_empty() {
            return Err(anyhow!("{backend_type:?} has no wgpu backend"));
        }

        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let power_preference = if config.prefer_discrete_gpu {
            wgpu::PowerPreference::HighPerformance
        } else {
            wgpu::PowerPreference::LowPower
        };
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference,
                compatible_surface: None, // Surfaces are created after selection
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| {
                anyhow!(
                    "Failed to find suitable adapter for {:?}: {}",
                    backend_type,
                    e
                )
            })?;

        // Verify that the adapter is actually using the requested backend
        let adapter_info = adapter.get_info();
        if adapter_info.backend != backend {
            return Err(anyhow!(
                "Adapter returned wrong backend: requested {:?}, got {:?}",
                backend,
                adapter_info.backend
            ));
        }

        log::info!(
            "{} backend succeeded with adapter: \"{}\"",
            backend_name(backend),
            adapter_info.name
        );

        Ok((instance, adapter))
    }

    /// Creates a device on the first preferred backend that initializes.
    ///
    /// Backends that fail, or that exceed `config.timeout_ms` on their own,
    /// are skipped with a warning.
    ///
    /// ## Errors
    /// Fails if every preferred backend failed.
    pub fn select_device(
        &self,
        config: &BackendSelectionConfig,
    ) -> Result<BackendSelectionResult<WgpuDevice>> {
        let start_time = Instant::now();
        let mut attempted_backends = Vec::new();

        log::info!("Starting WGPU backend selection process...");

        for &backend_type in &config.preferred_backends {
            attempted_backends.push(backend_type);

            log::info!("Attempting to initialize {backend_type:?} backend...");
            let attempt_start = Instant::now();

            let attempt = pollster::block_on(async {
                let (instance, adapter) = self.try_backend(backend_type, config).await?;
                WgpuGraphicsContext::new(instance, adapter).await
            });

            match attempt {
                Ok(_) if attempt_start.elapsed() > config.timeout() => {
                    log::warn!(
                        "{backend_type:?} backend took {} ms, over the {} ms budget.",
                        attempt_start.elapsed().as_millis(),
                        config.timeout_ms
                    );
                }
                Ok(context) => {
                    let adapter_info = Self::adapter_to_info(&context.adapter);
                    let selection_time_ms = start_time.elapsed().as_millis() as u64;

                    log::info!(
                        "Successfully selected {:?} backend with adapter: \"{}\" (Device: {:?})",
                        backend_type,
                        adapter_info.name,
                        adapter_info.device_type,
                    );

                    return Ok(BackendSelectionResult {
                        device: WgpuDevice::new(context),
                        adapter_info,
                        selection_time_ms,
                        attempted_backends,
                    });
                }
                Err(e) => {
                    log::warn!("Failed to initialize {backend_type:?} backend: {e}");
                }
            }
        }

        Err(anyhow!(
            "All backend attempts failed. Attempted: {attempted_backends:?}"
        ))
    }
}
