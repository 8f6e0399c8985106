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


use super::command::WgpuCommandBuffer;
use super::counter::WgpuCounter;
use super::swapchain::WgpuSwapchain;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vesta_core::renderer::{
    CommandBuffer, CommandBufferState, CompletionCounter, GpuError, PresentStatus, Queue,
    QueueType, SyncPoint, WaitStatus,
};

/// A submission endpoint over the device's `wgpu::Queue`.
///
/// `wgpu` exposes one queue per device: compute and copy queues share it,
/// which keeps every submission totally ordered.
#[derive(Debug)]
pub struct WgpuQueue {
    queue: wgpu::Queue,
    queue_type: QueueType,
    lost: Arc<AtomicBool>,
    idle: WgpuCounter,
}

impl WgpuQueue {
    pub(crate) fn new(
        queue: wgpu::Queue,
        device: wgpu::Device,
        queue_type: QueueType,
        lost: Arc<AtomicBool>,
    ) -> Self {
        let idle = WgpuCounter::new(Some("Queue Idle Fence"), device, lost.clone());
        Self {
            queue,
            queue_type,
            lost,
            idle,
        }
    }

    fn check_device(&self) -> Result<(), GpuError> {
        if self.lost.load(Ordering::SeqCst) {
            Err(GpuError::DeviceLost)
        } else {
            Ok(())
        }
    }
}

impl Queue for WgpuQueue {
    type CommandBuffer = WgpuCommandBuffer;
    type CompletionCounter = WgpuCounter;
    type Swapchain = WgpuSwapchain;

    fn queue_type(&self) -> QueueType {
        self.queue_type
    }

    fn submit(
        &mut self,
        command_buffers: &mut [&mut WgpuCommandBuffer],
        signal_counters: &[&WgpuCounter],
        swapchain: Option<&mut WgpuSwapchain>,
    ) -> Result<(), GpuError> {
        self.check_device()?;
        if let Some(buffer) = command_buffers
            .iter()
            .find(|buffer| buffer.state() != CommandBufferState::Executable)
        {
            return Err(GpuError::SubmissionFailed(format!(
                "command buffer '{}' is {:?}, not executable",
                buffer.label().unwrap_or("unnamed"),
                buffer.state()
            )));
        }
        if swapchain.is_some_and(|swapchain| !swapchain.is_image_acquired()) {
            return Err(GpuError::SubmissionFailed(
                "the swapchain image must be acquired before submitting work that renders to it"
                    .to_string(),
            ));
        }

        let mut finished = Vec::with_capacity(command_buffers.len());
        for buffer in command_buffers.iter_mut() {
            if let Some(commands) = buffer.take_finished() {
                finished.push(commands);
            }
            buffer.mark_pending();
        }
        self.queue.submit(finished);

        for counter in signal_counters {
            counter.signal_on(&self.queue);
        }
        Ok(())
    }

    fn present(
        &mut self,
        swapchain: &mut WgpuSwapchain,
        signal_counters: &[&WgpuCounter],
    ) -> Result<PresentStatus, GpuError> {
        self.check_device()?;
        let status = swapchain.present()?;
        for counter in signal_counters {
            counter.signal_on(&self.queue);
        }
        Ok(status)
    }

    fn wait(&mut self, counter: &WgpuCounter, value: SyncPoint) -> Result<(), GpuError> {
        self.check_device()?;
        // With a single queue, a signal already enqueued precedes everything
        // submitted from now on.
        if value > counter.sync_point() {
            return Err(GpuError::Backend(format!(
                "cannot wait for {value}, which was never signalled"
            )));
        }
        Ok(())
    }

    fn signal(&mut self, counter: &WgpuCounter) -> Result<SyncPoint, GpuError> {
        self.check_device()?;
        Ok(counter.signal_on(&self.queue))
    }

    fn wait_idle(&mut self, timeout: Duration) -> Result<WaitStatus, GpuError> {
        self.check_device()?;
        let value = self.idle.signal_on(&self.queue);
        self.idle.wait_for(value, timeout)
    }
}
