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


use super::backend::WgpuBackendSelector;
use super::command::WgpuCommandBuffer;
use super::context::WgpuGraphicsContext;
use super::counter::WgpuCounter;
use super::descriptor::WgpuDescriptorHeap;
use super::queue::WgpuQueue;
use super::swapchain::WgpuSwapchain;
use vesta_core::renderer::{
    DescriptorHeapDescriptor, GpuError, GraphicsAdapterInfo, GraphicsDevice, QueueType,
};

/// A thread-safe handle to a `wgpu` device.
#[derive(Debug)]
pub struct WgpuDevice {
    context: WgpuGraphicsContext,
}

impl WgpuDevice {
    /// Wraps an initialized context.
    pub fn new(context: WgpuGraphicsContext) -> Self {
        Self { context }
    }

    /// The underlying context, for recording with raw `wgpu` objects.
    pub fn context(&self) -> &WgpuGraphicsContext {
        &self.context
    }

    fn check_device(&self) -> Result<(), GpuError> {
        if self.context.is_lost() {
            Err(GpuError::DeviceLost)
        } else {
            Ok(())
        }
    }

    /// Polls the underlying wgpu::Device in a non-blocking manner.
    /// This runs the `on_submitted_work_done` callbacks of finished work.
    pub fn poll_device_non_blocking(&self) {
        if let Err(e) = self.context.device.poll(wgpu::PollType::Poll) {
            log::warn!("Failed to poll device (non-blocking): {:?}", e);
        }
    }

    /// Creates a swapchain presenting to `surface`, which must have been
    /// created from `self.context().instance`.
    pub fn create_swapchain(
        &self,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
    ) -> Result<WgpuSwapchain, GpuError> {
        self.check_device()?;
        WgpuSwapchain::new(
            surface,
            &self.context.adapter,
            self.context.device.clone(),
            width,
            height,
        )
    }
}

impl GraphicsDevice for WgpuDevice {
    type CommandBuffer = WgpuCommandBuffer;
    type CompletionCounter = WgpuCounter;
    type Swapchain = WgpuSwapchain;
    type DescriptorHeap = WgpuDescriptorHeap;
    type Queue = WgpuQueue;

    fn adapter_info(&self) -> GraphicsAdapterInfo {
        WgpuBackendSelector::adapter_to_info(&self.context.adapter)
    }

    fn create_queue(&self, queue_type: QueueType) -> Result<WgpuQueue, GpuError> {
        self.check_device()?;
        if queue_type != QueueType::Direct {
            log::debug!("wgpu has a single queue; {queue_type:?} work shares it.");
        }
        Ok(WgpuQueue::new(
            self.context.queue.clone(),
            self.context.device.clone(),
            queue_type,
            self.context.lost.clone(),
        ))
    }

    fn create_command_buffer(&self, label: Option<&str>) -> Result<WgpuCommandBuffer, GpuError> {
        self.check_device()?;
        Ok(WgpuCommandBuffer::new(self.context.device.clone(), label))
    }

    fn create_completion_counter(&self, label: Option<&str>) -> Result<WgpuCounter, GpuError> {
        self.check_device()?;
        Ok(WgpuCounter::new(
            label,
            self.context.device.clone(),
            self.context.lost.clone(),
        ))
    }

    fn create_descriptor_heap(
        &self,
        descriptor: &DescriptorHeapDescriptor,
    ) -> Result<WgpuDescriptorHeap, GpuError> {
        self.check_device()?;
        WgpuDescriptorHeap::new(descriptor)
    }
}
