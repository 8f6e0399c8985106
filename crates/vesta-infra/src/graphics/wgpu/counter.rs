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


use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use vesta_core::renderer::{CompletionCounter, GpuError, SyncPoint, WaitStatus};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A completion counter advanced by `on_submitted_work_done` callbacks.
#[derive(Debug)]
pub struct WgpuCounter {
    label: Option<String>,
    sync_point: AtomicU64,
    completed: Arc<AtomicU64>,
    device: wgpu::Device,
    lost: Arc<AtomicBool>,
}

impl WgpuCounter {
    pub(crate) fn new(label: Option<&str>, device: wgpu::Device, lost: Arc<AtomicBool>) -> Self {
        Self {
            label: label.map(str::to_string),
            sync_point: AtomicU64::new(0),
            completed: Arc::new(AtomicU64::new(0)),
            device,
            lost,
        }
    }

    /// The debug label given at creation.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Reserves the next sync point and has `queue` complete it once all the
    /// work submitted so far has finished.
    pub(crate) fn signal_on(&self, queue: &wgpu::Queue) -> SyncPoint {
        let value = self.signal();
        let completed = self.completed.clone();
        queue.on_submitted_work_done(move || {
            completed.fetch_max(value.value(), Ordering::SeqCst);
        });
        value
    }
}

impl CompletionCounter for WgpuCounter {
    fn completion_value(&self) -> SyncPoint {
        SyncPoint(self.completed.load(Ordering::SeqCst))
    }

    fn sync_point(&self) -> SyncPoint {
        SyncPoint(self.sync_point.load(Ordering::SeqCst))
    }

    fn signal(&self) -> SyncPoint {
        SyncPoint(self.sync_point.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn wait_for(&self, value: SyncPoint, timeout: Duration) -> Result<WaitStatus, GpuError> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if self.lost.load(Ordering::SeqCst) {
                return Err(GpuError::DeviceLost);
            }
            if self.is_completed(value) {
                return Ok(WaitStatus::Complete);
            }
            // Callbacks only run from inside a poll.
            if let Err(e) = self.device.poll(wgpu::PollType::Poll) {
                log::warn!("Failed to poll device (non-blocking): {:?}", e);
            }
            if self.is_completed(value) {
                return Ok(WaitStatus::Complete);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Ok(WaitStatus::TimedOut);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
