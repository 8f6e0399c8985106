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


use super::command::EmulatedCommandBuffer;
use super::counter::EmulatedCounter;
use super::descriptor::EmulatedDescriptorHeap;
use super::queue::EmulatedQueue;
use super::swapchain::EmulatedSwapchain;
use super::timeline::{EmulatedStats, Executor, PauseGate};
use super::{EmulatedConfig, EmulatedVariant};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vesta_core::renderer::{
    DescriptorHeapDescriptor, GpuError, GraphicsAdapterInfo, GraphicsDevice, QueueType,
    RendererDeviceType,
};

/// A graphics device whose GPU is a CPU thread.
#[derive(Debug)]
pub struct EmulatedDevice {
    config: EmulatedConfig,
    variant: EmulatedVariant,
    gate: Arc<PauseGate>,
    stats: Arc<EmulatedStats>,
    lost: Arc<AtomicBool>,
}

impl EmulatedDevice {
    /// Creates a device emulating `config.variant`, or
    /// [`EmulatedVariant::DescriptorHeap`] when none is set.
    ///
    /// ## Errors
    /// * `GpuError::Backend` - If swapchains would have fewer than two images.
    pub fn new(config: EmulatedConfig) -> Result<Self, GpuError> {
        if config.swapchain_images < 2 {
            return Err(GpuError::Backend(format!(
                "swapchains need at least 2 images, {} configured",
                config.swapchain_images
            )));
        }
        let variant = config.variant.unwrap_or(EmulatedVariant::DescriptorHeap);
        log::info!(
            "Created emulated {:?} device ({} execution).",
            variant.backend_type(),
            if variant.executes_inline() { "inline" } else { "queued" }
        );
        Ok(Self {
            config,
            variant,
            gate: Arc::default(),
            stats: Arc::default(),
            lost: Arc::default(),
        })
    }

    fn executor(&self) -> Executor {
        Executor {
            latency: Duration::from_micros(self.config.command_latency_us),
            stats: self.stats.clone(),
            lost: self.lost.clone(),
        }
    }

    fn check_device(&self) -> Result<(), GpuError> {
        if self.is_device_lost() {
            Err(GpuError::DeviceLost)
        } else {
            Ok(())
        }
    }

    /// The native API family this device reproduces.
    pub fn variant(&self) -> EmulatedVariant {
        self.variant
    }

    /// What the emulated GPU has done so far.
    pub fn stats(&self) -> &Arc<EmulatedStats> {
        &self.stats
    }

    /// Stops the GPU timelines of every queue: submissions are accepted but
    /// nothing executes or completes until [`resume_gpu`](Self::resume_gpu).
    /// Inline variants have no timeline to pause.
    pub fn pause_gpu(&self) {
        if self.variant.executes_inline() {
            log::debug!("{:?} executes inline, nothing to pause.", self.variant);
        }
        self.gate.pause();
    }

    /// Restarts the timelines stopped by [`pause_gpu`](Self::pause_gpu).
    pub fn resume_gpu(&self) {
        self.gate.resume();
    }

    /// Loses the device: pending work is dropped, counters stop advancing and
    /// every wait and submission reports `GpuError::DeviceLost` from now on.
    pub fn simulate_device_lost(&self) {
        log::error!("Emulated {:?} device lost.", self.variant.backend_type());
        self.lost.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once the device has been lost.
    pub fn is_device_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    /// Creates a swapchain of `config.swapchain_images` images.
    pub fn create_swapchain(&self, width: u32, height: u32) -> Result<EmulatedSwapchain, GpuError> {
        self.check_device()?;
        Ok(EmulatedSwapchain::new(width, height, self.config.swapchain_images))
    }
}

impl GraphicsDevice for EmulatedDevice {
    type CommandBuffer = EmulatedCommandBuffer;
    type CompletionCounter = EmulatedCounter;
    type Swapchain = EmulatedSwapchain;
    type DescriptorHeap = EmulatedDescriptorHeap;
    type Queue = EmulatedQueue;

    fn adapter_info(&self) -> GraphicsAdapterInfo {
        GraphicsAdapterInfo {
            name: format!("Emulated {:?}", self.variant.backend_type()),
            backend_type: self.variant.backend_type(),
            device_type: RendererDeviceType::Cpu,
        }
    }

    fn create_queue(&self, queue_type: QueueType) -> Result<EmulatedQueue, GpuError> {
        self.check_device()?;
        if self.variant.executes_inline() && queue_type != QueueType::Direct {
            return Err(GpuError::Backend(format!(
                "{:?} exposes a single immediate context, no {queue_type:?} queue",
                self.variant.backend_type()
            )));
        }
        EmulatedQueue::new(self.variant, queue_type, self.executor(), self.gate.clone())
    }

    fn create_command_buffer(&self, label: Option<&str>) -> Result<EmulatedCommandBuffer, GpuError> {
        self.check_device()?;
        Ok(EmulatedCommandBuffer::new(label))
    }

    fn create_completion_counter(&self, label: Option<&str>) -> Result<EmulatedCounter, GpuError> {
        self.check_device()?;
        Ok(EmulatedCounter::new(label, self.lost.clone()))
    }

    fn create_descriptor_heap(
        &self,
        descriptor: &DescriptorHeapDescriptor,
    ) -> Result<EmulatedDescriptorHeap, GpuError> {
        self.check_device()?;
        EmulatedDescriptorHeap::new(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesta_core::renderer::{
        CommandBuffer, CompletionCounter, PresentStatus, Queue, Swapchain, SyncPoint, WaitStatus,
    };

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn device(variant: EmulatedVariant) -> EmulatedDevice {
        EmulatedDevice::new(EmulatedConfig {
            variant: Some(variant),
            ..Default::default()
        })
        .unwrap()
    }

    fn recorded(device: &EmulatedDevice) -> EmulatedCommandBuffer {
        let mut buffer = device.create_command_buffer(Some("Test")).unwrap();
        buffer.begin().unwrap();
        buffer.draw(3, 1);
        buffer.end().unwrap();
        buffer
    }

    #[test]
    fn swapchains_need_two_images() {
        let config = EmulatedConfig {
            swapchain_images: 1,
            ..Default::default()
        };
        assert!(EmulatedDevice::new(config).is_err());
        assert_eq!(
            EmulatedDevice::new(EmulatedConfig::default()).unwrap().variant(),
            EmulatedVariant::DescriptorHeap
        );
    }

    #[test]
    fn inline_variants_complete_before_submit_returns() {
        for variant in [EmulatedVariant::Immediate, EmulatedVariant::Legacy] {
            let device = device(variant);
            let mut queue = device.create_queue(QueueType::Direct).unwrap();
            let counter = device.create_completion_counter(None).unwrap();
            let mut buffer = recorded(&device);

            queue.submit(&mut [&mut buffer], &[&counter], None).unwrap();

            assert_eq!(counter.completion_value(), SyncPoint(1));
            assert_eq!(device.stats().executed_commands(), 1);
            assert!(device.create_queue(QueueType::Compute).is_err());
        }
    }

    #[test]
    fn paused_timeline_defers_completion() {
        let device = device(EmulatedVariant::DescriptorHeap);
        let mut queue = device.create_queue(QueueType::Compute).unwrap();
        let counter = device.create_completion_counter(None).unwrap();
        let mut buffer = recorded(&device);

        device.pause_gpu();
        queue.submit(&mut [&mut buffer], &[&counter], None).unwrap();
        assert_eq!(counter.sync_point(), SyncPoint(1));
        assert_eq!(counter.completion_value(), SyncPoint::ZERO);

        device.resume_gpu();
        assert_eq!(counter.wait(TIMEOUT).unwrap(), WaitStatus::Complete);
        assert_eq!(device.stats().executed_command_lists(), 1);
    }

    #[test]
    fn resetting_before_completion_is_detected() {
        let device = device(EmulatedVariant::DescriptorHeap);
        let mut queue = device.create_queue(QueueType::Direct).unwrap();
        let mut buffer = recorded(&device);

        device.pause_gpu();
        queue.submit(&mut [&mut buffer], &[], None).unwrap();
        vesta_core::renderer::RecordingContext::reset(&mut buffer).unwrap();
        device.resume_gpu();

        assert_eq!(queue.wait_idle(TIMEOUT).unwrap(), WaitStatus::Complete);
        assert_eq!(device.stats().corrupted_executions(), 1);
    }

    #[test]
    fn explicit_timeline_requires_an_acquired_image() {
        let device = device(EmulatedVariant::ExplicitTimeline);
        let mut queue = device.create_queue(QueueType::Direct).unwrap();
        let mut swapchain = device.create_swapchain(64, 64).unwrap();
        let mut buffer = recorded(&device);

        assert!(matches!(
            queue.submit(&mut [&mut buffer], &[], Some(&mut swapchain)),
            Err(GpuError::SubmissionFailed(_))
        ));

        swapchain.prepare_next_frame().unwrap();
        queue
            .submit(&mut [&mut buffer], &[], Some(&mut swapchain))
            .unwrap();
        assert_eq!(
            queue.present(&mut swapchain, &[]).unwrap(),
            PresentStatus::Presented
        );
        assert_eq!(queue.wait_idle(TIMEOUT).unwrap(), WaitStatus::Complete);
        assert_eq!(device.stats().implicit_image_waits(), 1);
        assert_eq!(swapchain.current_image_index(), 1);
    }

    #[test]
    fn lost_device_rejects_everything() {
        let device = device(EmulatedVariant::DescriptorHeap);
        let mut queue = device.create_queue(QueueType::Direct).unwrap();
        let counter = device.create_completion_counter(None).unwrap();

        device.simulate_device_lost();

        assert_eq!(counter.wait_for(SyncPoint(1), TIMEOUT), Err(GpuError::DeviceLost));
        assert_eq!(queue.signal(&counter), Err(GpuError::DeviceLost));
        assert!(device.create_command_buffer(None).is_err());
    }

    #[test]
    fn immediate_context_cannot_wait_for_unsignalled_values() {
        let device = device(EmulatedVariant::Immediate);
        let mut queue = device.create_queue(QueueType::Direct).unwrap();
        let counter = device.create_completion_counter(None).unwrap();

        let value = queue.signal(&counter).unwrap();
        queue.wait(&counter, value).unwrap();
        assert!(queue.wait(&counter, value.next()).is_err());
    }
}
