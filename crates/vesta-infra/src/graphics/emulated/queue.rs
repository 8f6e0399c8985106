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
use super::swapchain::EmulatedSwapchain;
use super::timeline::{Executor, GpuOp, GpuTimeline, PauseGate};
use super::EmulatedVariant;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vesta_core::renderer::{
    CommandBuffer, CommandBufferState, CompletionCounter, GpuError, PresentStatus, Queue,
    QueueType, SyncPoint, WaitStatus,
};

/// A hardware queue of the emulated backend.
///
/// Inline variants run every operation on the calling thread; the others
/// forward them, in submission order, to a GPU timeline owned by the queue.
pub struct EmulatedQueue {
    variant: EmulatedVariant,
    queue_type: QueueType,
    timeline: Option<GpuTimeline>,
    executor: Executor,
    idle: EmulatedCounter,
}

impl EmulatedQueue {
    pub(crate) fn new(
        variant: EmulatedVariant,
        queue_type: QueueType,
        executor: Executor,
        gate: Arc<PauseGate>,
    ) -> Result<Self, GpuError> {
        let timeline = if variant.executes_inline() {
            None
        } else {
            let name = format!("Emulated {:?} {queue_type:?} Queue", variant.backend_type());
            Some(GpuTimeline::spawn(&name, executor.clone(), gate)?)
        };
        let idle = EmulatedCounter::new(Some("Queue Idle Fence"), executor.lost.clone());
        Ok(Self {
            variant,
            queue_type,
            timeline,
            executor,
            idle,
        })
    }

    /// The native API family this queue reproduces.
    pub fn variant(&self) -> EmulatedVariant {
        self.variant
    }

    fn check_device(&self) -> Result<(), GpuError> {
        if self.executor.lost.load(Ordering::SeqCst) {
            Err(GpuError::DeviceLost)
        } else {
            Ok(())
        }
    }

    fn dispatch(&self, op: GpuOp) -> Result<(), GpuError> {
        match &self.timeline {
            Some(timeline) => timeline.send(op),
            None => {
                self.executor.run(op, &AtomicBool::new(false));
                Ok(())
            }
        }
    }

    fn dispatch_signal(&self, counter: &EmulatedCounter) -> Result<SyncPoint, GpuError> {
        let value = counter.signal();
        self.dispatch(GpuOp::Signal {
            counter: counter.state().clone(),
            value: value.value(),
        })?;
        Ok(value)
    }
}

impl Queue for EmulatedQueue {
    type CommandBuffer = EmulatedCommandBuffer;
    type CompletionCounter = EmulatedCounter;
    type Swapchain = EmulatedSwapchain;

    fn queue_type(&self) -> QueueType {
        self.queue_type
    }

    fn submit(
        &mut self,
        command_buffers: &mut [&mut EmulatedCommandBuffer],
        signal_counters: &[&EmulatedCounter],
        swapchain: Option<&mut EmulatedSwapchain>,
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

        if let Some(swapchain) = swapchain {
            if self.variant.requires_acquired_image() {
                if !swapchain.is_image_acquired() {
                    return Err(GpuError::SubmissionFailed(
                        "the swapchain image must be acquired before submitting work that renders to it"
                            .to_string(),
                    ));
                }
                self.dispatch(GpuOp::ImageAcquired)?;
            }
        }

        for buffer in command_buffers.iter_mut() {
            let (memory, generation) = buffer.submission();
            self.dispatch(GpuOp::Execute { memory, generation })?;
            buffer.mark_pending();
        }
        for counter in signal_counters {
            self.dispatch_signal(counter)?;
        }
        self.executor.stats.record_submit();
        Ok(())
    }

    fn present(
        &mut self,
        swapchain: &mut EmulatedSwapchain,
        signal_counters: &[&EmulatedCounter],
    ) -> Result<PresentStatus, GpuError> {
        self.check_device()?;
        if swapchain.is_out_of_date() {
            log::debug!("Dropping present of an out-of-date swapchain.");
            return Ok(PresentStatus::OutOfDate);
        }
        if self.variant.requires_acquired_image() && !swapchain.is_image_acquired() {
            return Err(GpuError::Backend(
                "cannot present a swapchain image that was never acquired".to_string(),
            ));
        }
        swapchain.advance();
        self.executor.stats.record_present();
        for counter in signal_counters {
            self.dispatch_signal(counter)?;
        }
        Ok(PresentStatus::Presented)
    }

    fn wait(&mut self, counter: &EmulatedCounter, value: SyncPoint) -> Result<(), GpuError> {
        self.check_device()?;
        if self.timeline.is_none() {
            // A single immediate context has already executed every signal it
            // will ever see.
            return if counter.is_completed(value) {
                Ok(())
            } else {
                Err(GpuError::Backend(format!(
                    "an immediate context cannot wait for {value}, which it has not signalled"
                )))
            };
        }
        self.dispatch(GpuOp::Wait {
            counter: counter.state().clone(),
            value: value.value(),
        })
    }

    fn signal(&mut self, counter: &EmulatedCounter) -> Result<SyncPoint, GpuError> {
        self.check_device()?;
        self.dispatch_signal(counter)
    }

    fn wait_idle(&mut self, timeout: Duration) -> Result<WaitStatus, GpuError> {
        self.check_device()?;
        let value = self.dispatch_signal(&self.idle)?;
        self.idle.wait_for(value, timeout)
    }
}

impl fmt::Debug for EmulatedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmulatedQueue")
            .field("variant", &self.variant)
            .field("queue_type", &self.queue_type)
            .finish()
    }
}
