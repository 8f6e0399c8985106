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


//! A hand-driven mock backend for unit tests.
//!
//! Nothing completes on its own: a test advances the GPU timeline explicitly
//! through [`ManualCounter::complete`], which makes every ordering scenario
//! deterministic.

use crate::renderer::api::*;
use crate::renderer::async_compute::AsyncComputeThread;
use crate::renderer::error::GpuError;
use crate::renderer::traits::*;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Blocks until every task enqueued so far has executed, without waiting for the GPU.
pub(crate) fn flush<D: GraphicsDevice>(worker: &AsyncComputeThread<D>) {
    let (tx, rx) = std::sync::mpsc::channel();
    worker
        .queue_operation(move |_| {
            let _ = tx.send(());
            Ok(())
        })
        .unwrap();
    rx.recv_timeout(Duration::from_secs(5))
        .expect("worker did not flush");
}

#[derive(Debug, Default)]
pub(crate) struct ManualStats {
    submit_calls: AtomicUsize,
    command_buffers_created: AtomicUsize,
    command_buffers_dropped: AtomicUsize,
    resets: AtomicUsize,
    heaps_created: AtomicUsize,
    queues_idled: AtomicUsize,
    fail_next_submit: Mutex<Option<GpuError>>,
    submitted_labels: Mutex<Vec<String>>,
}

impl ManualStats {
    pub(crate) fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn command_buffers_created(&self) -> usize {
        self.command_buffers_created.load(Ordering::SeqCst)
    }

    pub(crate) fn command_buffers_dropped(&self) -> usize {
        self.command_buffers_dropped.load(Ordering::SeqCst)
    }

    pub(crate) fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub(crate) fn heaps_created(&self) -> usize {
        self.heaps_created.load(Ordering::SeqCst)
    }

    pub(crate) fn queues_idled(&self) -> usize {
        self.queues_idled.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next_submit(&self, error: GpuError) {
        *self.fail_next_submit.lock().unwrap() = Some(error);
    }

    pub(crate) fn submitted_labels(&self) -> Vec<String> {
        self.submitted_labels.lock().unwrap().clone()
    }
}

#[derive(Debug, Default)]
pub(crate) struct ManualCounter {
    sync_point: AtomicU64,
    completed: Mutex<u64>,
    cond: Condvar,
    lost: AtomicBool,
}

impl ManualCounter {
    /// Lets the "GPU" reach `value`.
    pub(crate) fn complete(&self, value: u64) {
        let mut completed = self.completed.lock().unwrap();
        *completed = (*completed).max(value);
        self.cond.notify_all();
    }

    /// Lets the "GPU" reach the latest issued sync point.
    pub(crate) fn complete_all(&self) {
        self.complete(self.sync_point.load(Ordering::SeqCst));
    }

    pub(crate) fn lose_device(&self) {
        self.lost.store(true, Ordering::SeqCst);
        self.cond.notify_all();
    }
}

impl CompletionCounter for ManualCounter {
    fn completion_value(&self) -> SyncPoint {
        SyncPoint(*self.completed.lock().unwrap())
    }

    fn sync_point(&self) -> SyncPoint {
        SyncPoint(self.sync_point.load(Ordering::SeqCst))
    }

    fn signal(&self) -> SyncPoint {
        SyncPoint(self.sync_point.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn wait_for(&self, value: SyncPoint, timeout: Duration) -> Result<WaitStatus, GpuError> {
        let deadline = Instant::now() + timeout;
        let mut completed = self.completed.lock().unwrap();
        loop {
            if self.lost.load(Ordering::SeqCst) {
                return Err(GpuError::DeviceLost);
            }
            if *completed >= value.0 {
                return Ok(WaitStatus::Complete);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(WaitStatus::TimedOut);
            }
            completed = self.cond.wait_timeout(completed, deadline - now).unwrap().0;
        }
    }
}

#[derive(Debug)]
pub(crate) struct ManualCommandBuffer {
    label: Option<String>,
    state: CommandBufferState,
    pub(crate) commands: Vec<String>,
    stats: Arc<ManualStats>,
}

impl ManualCommandBuffer {
    pub(crate) fn record(&mut self, command: &str) {
        assert_eq!(self.state, CommandBufferState::Recording);
        self.commands.push(command.to_string());
    }
}

impl RecordingContext for ManualCommandBuffer {
    fn reset(&mut self) -> Result<(), GpuError> {
        self.stats.resets.fetch_add(1, Ordering::SeqCst);
        self.commands.clear();
        self.state = CommandBufferState::Initial;
        Ok(())
    }
}

impl CommandBuffer for ManualCommandBuffer {
    fn begin(&mut self) -> Result<(), GpuError> {
        match self.state {
            CommandBufferState::Initial | CommandBufferState::Executable => {
                self.commands.clear();
                self.state = CommandBufferState::Recording;
                Ok(())
            }
            state => Err(GpuError::Internal(format!("begin() while {state:?}"))),
        }
    }

    fn end(&mut self) -> Result<(), GpuError> {
        if self.state != CommandBufferState::Recording {
            return Err(GpuError::Internal(format!("end() while {:?}", self.state)));
        }
        self.state = CommandBufferState::Executable;
        Ok(())
    }

    fn state(&self) -> CommandBufferState {
        self.state
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl Drop for ManualCommandBuffer {
    fn drop(&mut self) {
        self.stats
            .command_buffers_dropped
            .fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub(crate) struct ManualSwapchain {
    index: u32,
}

impl Swapchain for ManualSwapchain {
    fn prepare_next_frame(&mut self) -> Result<u32, GpuError> {
        Ok(self.index)
    }

    fn resize(&mut self, _width: u32, _height: u32) -> Result<(), GpuError> {
        Ok(())
    }

    fn current_image_index(&self) -> u32 {
        self.index
    }

    fn image_count(&self) -> u32 {
        2
    }

    fn extent(&self) -> (u32, u32) {
        (1, 1)
    }
}

#[derive(Debug)]
pub(crate) struct ManualDescriptorHeap {
    kind: DescriptorHeapKind,
    shader_visible: bool,
    pub(crate) entries: Vec<Option<DescriptorEntry>>,
}

impl DescriptorHeap for ManualDescriptorHeap {
    fn kind(&self) -> DescriptorHeapKind {
        self.kind
    }

    fn capacity(&self) -> u32 {
        self.entries.len() as u32
    }

    fn is_shader_visible(&self) -> bool {
        self.shader_visible
    }

    fn write(&mut self, index: u32, entry: DescriptorEntry) -> Result<(), GpuError> {
        if !self.kind.accepts(&entry) {
            return Err(GpuError::Backend(format!(
                "{entry:?} cannot be stored in a {:?} heap",
                self.kind
            )));
        }
        let slot = self
            .entries
            .get_mut(index as usize)
            .ok_or_else(|| GpuError::AllocationFailed(format!("slot {index} out of range")))?;
        *slot = Some(entry);
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct ManualQueue {
    stats: Arc<ManualStats>,
}

impl Queue for ManualQueue {
    type CommandBuffer = ManualCommandBuffer;
    type CompletionCounter = ManualCounter;
    type Swapchain = ManualSwapchain;

    fn queue_type(&self) -> QueueType {
        QueueType::Direct
    }

    fn submit(
        &mut self,
        command_buffers: &mut [&mut ManualCommandBuffer],
        signal_counters: &[&ManualCounter],
        _swapchain: Option<&mut ManualSwapchain>,
    ) -> Result<(), GpuError> {
        if let Some(error) = self.stats.fail_next_submit.lock().unwrap().take() {
            return Err(error);
        }
        for buffer in command_buffers.iter_mut() {
            if buffer.state != CommandBufferState::Executable {
                return Err(GpuError::SubmissionFailed(format!(
                    "command buffer is {:?}",
                    buffer.state
                )));
            }
        }
        self.stats.submit_calls.fetch_add(1, Ordering::SeqCst);
        for buffer in command_buffers.iter_mut() {
            buffer.state = CommandBufferState::Pending;
            if let Some(label) = &buffer.label {
                self.stats.submitted_labels.lock().unwrap().push(label.clone());
            }
        }
        for counter in signal_counters {
            counter.signal();
        }
        Ok(())
    }

    fn present(
        &mut self,
        swapchain: &mut ManualSwapchain,
        signal_counters: &[&ManualCounter],
    ) -> Result<PresentStatus, GpuError> {
        swapchain.index = (swapchain.index + 1) % swapchain.image_count();
        for counter in signal_counters {
            counter.signal();
        }
        Ok(PresentStatus::Presented)
    }

    fn wait(&mut self, _counter: &ManualCounter, _value: SyncPoint) -> Result<(), GpuError> {
        Ok(())
    }

    fn signal(&mut self, counter: &ManualCounter) -> Result<SyncPoint, GpuError> {
        Ok(counter.signal())
    }

    fn wait_idle(&mut self, _timeout: Duration) -> Result<WaitStatus, GpuError> {
        self.stats.queues_idled.fetch_add(1, Ordering::SeqCst);
        Ok(WaitStatus::Complete)
    }
}

#[derive(Debug, Default)]
pub(crate) struct ManualDevice {
    stats: Arc<ManualStats>,
}

impl ManualDevice {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn stats(&self) -> &Arc<ManualStats> {
        &self.stats
    }
}

impl GraphicsDevice for ManualDevice {
    type CommandBuffer = ManualCommandBuffer;
    type CompletionCounter = ManualCounter;
    type Swapchain = ManualSwapchain;
    type DescriptorHeap = ManualDescriptorHeap;
    type Queue = ManualQueue;

    fn adapter_info(&self) -> GraphicsAdapterInfo {
        GraphicsAdapterInfo {
            name: "Manual".to_string(),
            backend_type: GraphicsBackendType::Unknown,
            device_type: RendererDeviceType::Cpu,
        }
    }

    fn create_queue(&self, _queue_type: QueueType) -> Result<ManualQueue, GpuError> {
        Ok(ManualQueue {
            stats: self.stats.clone(),
        })
    }

    fn create_command_buffer(&self, label: Option<&str>) -> Result<ManualCommandBuffer, GpuError> {
        self.stats
            .command_buffers_created
            .fetch_add(1, Ordering::SeqCst);
        Ok(ManualCommandBuffer {
            label: label.map(str::to_string),
            state: CommandBufferState::Initial,
            commands: Vec::new(),
            stats: self.stats.clone(),
        })
    }

    fn create_completion_counter(&self, _label: Option<&str>) -> Result<ManualCounter, GpuError> {
        Ok(ManualCounter::default())
    }

    fn create_descriptor_heap(
        &self,
        descriptor: &DescriptorHeapDescriptor,
    ) -> Result<ManualDescriptorHeap, GpuError> {
        self.stats.heaps_created.fetch_add(1, Ordering::SeqCst);
        Ok(ManualDescriptorHeap {
            kind: descriptor.kind,
            shader_visible: descriptor.shader_visible,
            entries: vec![None; descriptor.capacity as usize],
        })
    }
}
