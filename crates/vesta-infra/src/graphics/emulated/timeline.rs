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


//! The CPU thread standing in for the GPU, and the state it shares with the
//! emulated objects.

use super::command::CommandMemory;
use flume::{Receiver, Sender};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use vesta_core::renderer::{GpuError, WaitStatus};

/// Longest a blocked waiter sleeps before re-checking for device loss.
const LOST_CHECK_INTERVAL: Duration = Duration::from_millis(5);

/// Counters describing what the emulated GPU has done.
#[derive(Debug, Default)]
pub struct EmulatedStats {
    submits: AtomicU64,
    executed_command_lists: AtomicU64,
    executed_commands: AtomicU64,
    corrupted_executions: AtomicU64,
    presents: AtomicU64,
    implicit_image_waits: AtomicU64,
}

impl EmulatedStats {
    /// Native submit calls accepted by a queue.
    pub fn submits(&self) -> u64 {
        self.submits.load(Ordering::SeqCst)
    }

    /// Command lists the GPU executed.
    pub fn executed_command_lists(&self) -> u64 {
        self.executed_command_lists.load(Ordering::SeqCst)
    }

    /// Individual commands the GPU executed.
    pub fn executed_commands(&self) -> u64 {
        self.executed_commands.load(Ordering::SeqCst)
    }

    /// Command lists whose memory was reset before the GPU got to execute them.
    /// Anything but zero means a recording context was recycled too early.
    pub fn corrupted_executions(&self) -> u64 {
        self.corrupted_executions.load(Ordering::SeqCst)
    }

    /// Images queued for display.
    pub fn presents(&self) -> u64 {
        self.presents.load(Ordering::SeqCst)
    }

    /// Submissions that waited for the swapchain's acquired image.
    pub fn implicit_image_waits(&self) -> u64 {
        self.implicit_image_waits.load(Ordering::SeqCst)
    }

    pub(crate) fn record_submit(&self) {
        self.submits.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_present(&self) {
        self.presents.fetch_add(1, Ordering::SeqCst);
    }
}

/// The GPU-visible half of a completion counter.
#[derive(Debug)]
pub(crate) struct CounterState {
    completed: Mutex<u64>,
    cond: Condvar,
    lost: Arc<AtomicBool>,
}

impl CounterState {
    pub(crate) fn new(lost: Arc<AtomicBool>) -> Self {
        Self {
            completed: Mutex::new(0),
            cond: Condvar::new(),
            lost,
        }
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        self.completed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn completed(&self) -> u64 {
        *self.lock()
    }

    /// Raises the completed value to `value`. Never lowers it.
    pub(crate) fn complete(&self, value: u64) {
        let mut completed = self.lock();
        *completed = (*completed).max(value);
        self.cond.notify_all();
    }

    pub(crate) fn wait_for(&self, value: u64, timeout: Duration) -> Result<WaitStatus, GpuError> {
        let deadline = Instant::now().checked_add(timeout);
        let mut completed = self.lock();
        loop {
            if self.lost.load(Ordering::SeqCst) {
                return Err(GpuError::DeviceLost);
            }
            if *completed >= value {
                return Ok(WaitStatus::Complete);
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(WaitStatus::TimedOut);
                    }
                    (deadline - now).min(LOST_CHECK_INTERVAL)
                }
                None => LOST_CHECK_INTERVAL,
            };
            completed = self
                .cond
                .wait_timeout(completed, slice)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

/// One operation on the GPU timeline.
pub(crate) enum GpuOp {
    /// Execute a recorded command list. `generation` is the generation of the
    /// command memory at submission time.
    Execute {
        memory: Arc<CommandMemory>,
        generation: u64,
    },
    /// Raise a counter once everything before it has executed.
    Signal {
        counter: Arc<CounterState>,
        value: u64,
    },
    /// Stall the timeline until a counter reaches a value.
    Wait {
        counter: Arc<CounterState>,
        value: u64,
    },
    /// Stall until the swapchain image is available.
    ImageAcquired,
}

/// Everything an operation needs to run, inline or on the timeline thread.
#[derive(Clone)]
pub(crate) struct Executor {
    pub(crate) latency: Duration,
    pub(crate) stats: Arc<EmulatedStats>,
    pub(crate) lost: Arc<AtomicBool>,
}

impl Executor {
    pub(crate) fn run(&self, op: GpuOp, shutdown: &AtomicBool) {
        if self.lost.load(Ordering::SeqCst) {
            return;
        }
        match op {
            GpuOp::Execute { memory, generation } => {
                let commands = match memory.read(generation) {
                    Some(commands) => commands,
                    None => {
                        self.stats
                            .corrupted_executions
                            .fetch_add(1, Ordering::SeqCst);
                        log::error!("Command memory was reset before the GPU executed it.");
                        return;
                    }
                };
                for _ in 0..commands {
                    if !self.latency.is_zero() {
                        thread::sleep(self.latency);
                    }
                    self.stats.executed_commands.fetch_add(1, Ordering::SeqCst);
                }
                self.stats
                    .executed_command_lists
                    .fetch_add(1, Ordering::SeqCst);
            }
            GpuOp::Signal { counter, value } => counter.complete(value),
            GpuOp::Wait { counter, value } => {
                while !shutdown.load(Ordering::SeqCst) {
                    match counter.wait_for(value, LOST_CHECK_INTERVAL) {
                        Ok(WaitStatus::TimedOut) => continue,
                        Ok(WaitStatus::Complete) | Err(_) => break,
                    }
                }
            }
            GpuOp::ImageAcquired => {
                self.stats
                    .implicit_image_waits
                    .fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

/// The pause switch shared by every timeline of a device.
#[derive(Debug, Default)]
pub(crate) struct PauseGate {
    paused: Mutex<bool>,
    cond: Condvar,
}

impl PauseGate {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.paused.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, paused: bool) {
        *self.lock() = paused;
        self.cond.notify_all();
    }

    /// Stops every timeline from executing. Operations keep being accepted.
    pub(crate) fn pause(&self) {
        self.set(true);
    }

    pub(crate) fn resume(&self) {
        self.set(false);
    }

    pub(crate) fn is_paused(&self) -> bool {
        *self.lock()
    }

    fn wake(&self) {
        let _paused = self.lock();
        self.cond.notify_all();
    }

    fn wait_open(&self, shutdown: &AtomicBool) {
        let mut paused = self.lock();
        while *paused && !shutdown.load(Ordering::SeqCst) {
            paused = self
                .cond
                .wait(paused)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// The thread executing the [`GpuOp`]s of one queue in submission order.
pub(crate) struct GpuTimeline {
    sender: Option<Sender<GpuOp>>,
    handle: Option<JoinHandle<()>>,
    gate: Arc<PauseGate>,
    shutdown: Arc<AtomicBool>,
}

impl GpuTimeline {
    pub(crate) fn spawn(
        name: &str,
        executor: Executor,
        gate: Arc<PauseGate>,
    ) -> Result<Self, GpuError> {
        let (sender, receiver) = flume::unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_gate = gate.clone();
        let thread_shutdown = shutdown.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || Self::run(receiver, executor, thread_gate, thread_shutdown))
            .map_err(|e| GpuError::Internal(format!("failed to spawn GPU timeline: {e}")))?;
        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            gate,
            shutdown,
        })
    }

    fn run(
        receiver: Receiver<GpuOp>,
        executor: Executor,
        gate: Arc<PauseGate>,
        shutdown: Arc<AtomicBool>,
    ) {
        log::debug!("GPU timeline started.");
        for op in receiver.iter() {
            gate.wait_open(&shutdown);
            executor.run(op, &shutdown);
        }
        log::debug!("GPU timeline stopped.");
    }

    pub(crate) fn send(&self, op: GpuOp) -> Result<(), GpuError> {
        self.sender
            .as_ref()
            .ok_or(GpuError::DeviceLost)?
            .send(op)
            .map_err(|_| GpuError::DeviceLost)
    }
}

impl Drop for GpuTimeline {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.gate.wake();
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("GPU timeline thread panicked.");
            }
        }
    }
}

impl fmt::Debug for GpuTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuTimeline")
            .field("paused", &self.gate.is_paused())
            .finish()
    }
}
