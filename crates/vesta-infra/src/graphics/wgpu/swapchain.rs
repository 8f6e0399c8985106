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


use vesta_core::renderer::{GpuError, PresentStatus, Swapchain};

/// A configured `wgpu::Surface` and the frame currently acquired from it.
#[derive(Debug)]
pub struct WgpuSwapchain {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    config: wgpu::SurfaceConfiguration,
    frame: Option<wgpu::SurfaceTexture>,
    index: u32,
}

impl WgpuSwapchain {
    pub(crate) fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: wgpu::Device,
        width: u32,
        height: u32,
    ) -> Result<Self, GpuError> {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| {
                GpuError::Backend("the surface is not compatible with the adapter".to_string())
            })?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: surface_caps
                .present_modes
                .iter()
                .copied()
                .find(|m| *m == wgpu::PresentMode::Mailbox)
                .unwrap_or(wgpu::PresentMode::Fifo), // Fifo is guaranteed to be supported
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::debug!("Configured surface: {config:?}");

        Ok(Self {
            surface,
            device,
            config,
            frame: None,
            index: 0,
        })
    }

    /// The texture acquired by `prepare_next_frame`, to render into.
    pub fn current_frame(&self) -> Option<&wgpu::SurfaceTexture> {
        self.frame.as_ref()
    }

    /// The surface configuration in use.
    pub fn surface_configuration(&self) -> &wgpu::SurfaceConfiguration {
        &self.config
    }

    pub(crate) fn is_image_acquired(&self) -> bool {
        self.frame.is_some()
    }

    pub(crate) fn present(&mut self) -> Result<PresentStatus, GpuError> {
        let frame = self.frame.take().ok_or_else(|| {
            GpuError::Backend("cannot present a swapchain image that was never acquired".to_string())
        })?;
        if frame.suboptimal {
            log::debug!("WgpuSwapchain: Presenting a suboptimal frame.");
        }
        frame.present();
        self.index = (self.index + 1) % self.image_count();
        Ok(PresentStatus::Presented)
    }
}

impl Swapchain for WgpuSwapchain {
    fn prepare_next_frame(&mut self) -> Result<u32, GpuError> {
        if self.frame.is_some() {
            return Ok(self.index);
        }
        match self.surface.get_current_texture() {
            Ok(frame) => {
                self.frame = Some(frame);
                Ok(self.index)
            }
            Err(e @ wgpu::SurfaceError::Lost) | Err(e @ wgpu::SurfaceError::Outdated) => {
                log::warn!("WgpuSwapchain: Surface needs reconfiguring ({e:?}).");
                Err(GpuError::SwapchainOutOfDate)
            }
            Err(e @ wgpu::SurfaceError::OutOfMemory) => {
                log::error!("WgpuSwapchain: Out of memory acquiring surface texture.");
                Err(GpuError::AllocationFailed(format!("{e:?}")))
            }
            Err(e) => {
                log::error!("WgpuSwapchain: Unexpected SurfaceError: {e:?}");
                Err(GpuError::Backend(format!("{e:?}")))
            }
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), GpuError> {
        if width > 0 && height > 0 {
            log::info!("WgpuSwapchain: Resizing surface configuration to {width}x{height}");
            self.frame = None;
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.index = 0;
        } else {
            log::warn!("WgpuSwapchain: Ignoring resize request to zero dimensions: {width}x{height}");
        }
        Ok(())
    }

    fn current_image_index(&self) -> u32 {
        self.index
    }

    fn image_count(&self) -> u32 {
        self.config.desired_maximum_frame_latency + 1
    }

    fn extent(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
