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


use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wgpu::{Adapter, Instance};

/// Holds the core WGPU state objects of a headless device.
/// It is initialized with a pre-selected adapter, making it a passive component.
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    /// The instance the adapter belongs to. Surfaces must be created from it.
    pub instance: Instance,
    /// The selected adapter.
    pub adapter: Adapter,
    /// The logical device.
    pub device: wgpu::Device,
    /// The device's only queue.
    pub queue: wgpu::Queue,

    // Store info for easy access
    /// Human-readable adapter name.
    pub adapter_name: String,
    /// The native API behind the adapter.
    pub adapter_backend: wgpu::Backend,
    /// The physical type of the adapter.
    pub adapter_device_type: wgpu::DeviceType,

    /// Raised by the device-lost callback.
    pub lost: Arc<AtomicBool>,
}

impl WgpuGraphicsContext {
    /// Asynchronously creates the logical device and its queue.
    ///
    /// ## Arguments
    /// * `instance` - The instance the adapter was enumerated from.
    /// * `adapter` - The pre-selected `wgpu::Adapter` to use.
    ///
    /// ## Returns
    /// * `Result<Self>` - A result containing the initialized `WgpuGraphicsContext` or an error.
    pub async fn new(instance: Instance, adapter: Adapter) -> Result<Self> {
        log::info!("Initializing WGPU Graphics Context with pre-selected adapter...");

        let adapter_info = adapter.get_info();
        log::info!(
            "Using provided graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Vesta Logical Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;
        log::info!("Logical device and command queue created.");

        let lost = Arc::new(AtomicBool::new(false));
        let lost_flag = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            log::error!("WGPU device lost ({reason:?}): {message}");
            lost_flag.store(true, Ordering::SeqCst);
        });

        Ok(WgpuGraphicsContext {
            instance,
            adapter,
            device,
            queue,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            adapter_device_type: adapter_info.device_type,
            lost,
        })
    }

    /// The logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The device's queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns `true` once the device-lost callback has fired.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }
}
