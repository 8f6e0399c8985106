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


use super::completion::CompletionQueue;
use super::task::{AsyncTask, CompletionCallback};
use super::{AsyncComputeConfig, SubmissionListener, SubmissionStats};
use crate::renderer::api::{CommandBufferState, SyncPoint, WaitStatus};
use crate::renderer::error::GpuError;
use crate::renderer::pool::{PooledContext, RecordingContextPool};
use crate::renderer::traits::{CommandBuffer, CompletionCounter, GraphicsDevice, Queue};
use flume::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// State shared between the producers and the worker thread.
#[derive(Default)]
struct Shared {
    /// Tasks enqueued but not yet executed.
    pending: Mutex<usize>,
    idle: Condvar,
    stopped: AtomicBool,
    fatal: Mutex<Option<GpuError>>,
    native_submits: AtomicU64,
    contexts_created: AtomicU64,
    contexts_reused: AtomicU64,
    callbacks_fired: AtomicU64,
}

impl Shared {
    fn pending(&self) -> MutexGuard<'_, usize> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn task_enqueued(&self) {
        *self.pending() += 1;
    }

    fn tasks_retired(&self, count: usize) {
        let mut pending = self.pending();
        *pending = pending.saturating_sub(count);
        if *pending == 0 {
            self.idle.notify_all();
        }
    }

    fn fatal(&self) -> Option<GpuError> {
        self.fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_fatal(&self, error: GpuError) {
        self.fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(error);
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Marks the worker as stopped when its thread ends, including by panic, so
/// producers blocked in `wait_idle` are released.
struct StopGuard(Arc<Shared>);

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.0.stopped.store(true, Ordering::SeqCst);
        let mut pending = self.0.pending();
        *pending = 0;
        self.0.idle.notify_all();
    }
}

/// A dedicated thread that serializes all GPU queue interactions.
///
/// Producers on any thread enqueue [`AsyncTask`]s with [`execute`](Self::execute)
/// (or the typed helpers); the worker executes them one at a time in enqueue
/// order. The worker owns the queue, the active command buffer and the pool of
/// submitted command buffers, which it recycles once its completion counter has
/// reached the sync point they were submitted at.
///
/// A fatal [`GpuError`] stops the worker: it is logged, and returned from every
/// later call to `execute`, `wait_idle` and `join`.
pub struct AsyncComputeThread<D: GraphicsDevice> {
    sender: Option<Sender<AsyncTask<D>>>,
    handle: Option<JoinHandle<()>>,
    counter: Arc<D::CompletionCounter>,
    shared: Arc<Shared>,
    config: AsyncComputeConfig,
}

impl<D: GraphicsDevice> AsyncComputeThread<D> {
    /// Spawns the worker thread.
    ///
    /// ## Errors
    /// * `GpuError::Internal` - If the OS refuses to spawn the thread.
    /// * Any error from creating the completion counter.
    pub fn new(device: Arc<D>, config: AsyncComputeConfig) -> Result<Self, GpuError> {
        Self::with_listeners(device, config, Vec::new())
    }

    /// Spawns the worker thread with listeners notified after every native submission.
    pub fn with_listeners(
        device: Arc<D>,
        config: AsyncComputeConfig,
        listeners: Vec<Arc<dyn SubmissionListener>>,
    ) -> Result<Self, GpuError> {
        let counter = Arc::new(device.create_completion_counter(Some(&config.thread_name))?);
        let shared = Arc::new(Shared::default());
        let (sender, receiver) = flume::unbounded();

        let worker = Worker {
            pool: RecordingContextPool::new(format!("{} CommandBuffer", config.thread_name)),
            device,
            counter: counter.clone(),
            shared: shared.clone(),
            config: config.clone(),
            listeners,
            queue: None,
            active: None,
            completions: CompletionQueue::new(),
            recording: 0,
            next_sync_point: SyncPoint(1),
        };

        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker.run(receiver))
            .map_err(|e| GpuError::Internal(format!("failed to spawn worker thread: {e}")))?;

        log::info!("{} started.", config.thread_name);

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            counter,
            shared,
            config,
        })
    }

    /// Enqueues `task`. Safe to call from any thread.
    ///
    /// ## Errors
    /// * The fatal error that stopped the worker, if any.
    /// * `GpuError::WorkerStopped` - If the worker has terminated.
    pub fn execute(&self, task: AsyncTask<D>) -> Result<(), GpuError> {
        if let Some(error) = self.shared.fatal() {
            return Err(error);
        }
        let stopped = || self.shared.fatal().unwrap_or(GpuError::WorkerStopped);
        if self.shared.stopped.load(Ordering::SeqCst) {
            return Err(stopped());
        }
        let Some(sender) = &self.sender else {
            return Err(stopped());
        };
        log::trace!("Enqueue {task:?}");
        self.shared.task_enqueued();
        sender.send(task).map_err(|_| {
            self.shared.tasks_retired(1);
            stopped()
        })
    }

    /// Hands `queue` to the worker.
    pub fn set_queue(&self, queue: D::Queue) -> Result<(), GpuError> {
        self.execute(AsyncTask::SetQueue(queue))
    }

    /// Runs `operation` against the worker's queue.
    pub fn queue_operation<F>(&self, operation: F) -> Result<(), GpuError>
    where
        F: FnOnce(&mut D::Queue) -> Result<(), GpuError> + Send + 'static,
    {
        self.execute(AsyncTask::QueueOperation(Box::new(operation)))
    }

    /// Begins recording into a (possibly recycled) command buffer.
    pub fn begin_recording(&self) -> Result<(), GpuError> {
        self.execute(AsyncTask::BeginRecording)
    }

    /// Records commands into the active command buffer.
    pub fn record<F>(&self, recording: F) -> Result<(), GpuError>
    where
        F: FnOnce(SyncPoint, &mut D::CommandBuffer) + Send + 'static,
    {
        self.execute(AsyncTask::Recording(Box::new(recording)))
    }

    /// Ends recording on the active command buffer.
    pub fn end_recording(&self) -> Result<(), GpuError> {
        self.execute(AsyncTask::EndRecording)
    }

    /// Submits what was recorded since the last submission.
    pub fn submit(&self) -> Result<(), GpuError> {
        self.execute(AsyncTask::Submitting)
    }

    /// Runs `callback` on the worker thread once the next submission completes.
    pub fn on_completed<F>(&self, callback: F) -> Result<(), GpuError>
    where
        F: FnOnce() + Send + 'static,
    {
        let callback: CompletionCallback = Box::new(callback);
        self.execute(AsyncTask::ExecutionCompleted(callback))
    }

    /// Blocks until every enqueued task has executed and the GPU has reached
    /// the last sync point the worker issued.
    ///
    /// ## Errors
    /// * The fatal error that stopped the worker, if any.
    /// * `GpuError::Timeout` - If the GPU did not catch up within the configured timeout.
    pub fn wait_idle(&self) -> Result<(), GpuError> {
        {
            let mut pending = self.shared.pending();
            while *pending > 0 && !self.shared.stopped.load(Ordering::SeqCst) {
                pending = self
                    .shared
                    .idle
                    .wait(pending)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }

        if let Some(error) = self.shared.fatal() {
            return Err(error);
        }

        let target = self.counter.sync_point();
        if self.counter.is_completed(target) {
            return Ok(());
        }
        match self
            .counter
            .wait_for(target, self.config.wait_idle_timeout())?
        {
            WaitStatus::Complete => Ok(()),
            WaitStatus::TimedOut => Err(GpuError::Timeout {
                awaited: target.value(),
                completed: self.counter.completion_value().value(),
            }),
        }
    }

    /// Returns `true` if the GPU has reached `value` on the worker's counter.
    pub fn is_execution_completed(&self, value: SyncPoint) -> bool {
        self.counter.is_completed(value)
    }

    /// The completion counter every worker submission signals.
    pub fn completion_counter(&self) -> &Arc<D::CompletionCounter> {
        &self.counter
    }

    /// Returns `true` while the worker accepts tasks.
    pub fn is_running(&self) -> bool {
        !self.shared.stopped.load(Ordering::SeqCst)
    }

    /// A snapshot of the worker's diagnostic counters.
    pub fn stats(&self) -> SubmissionStats {
        SubmissionStats {
            native_submits: self.shared.native_submits.load(Ordering::Relaxed),
            contexts_created: self.shared.contexts_created.load(Ordering::Relaxed),
            contexts_reused: self.shared.contexts_reused.load(Ordering::Relaxed),
            callbacks_fired: self.shared.callbacks_fired.load(Ordering::Relaxed),
        }
    }

    /// Stops accepting work, lets the worker drain and terminate, and waits for
    /// the thread to end.
    ///
    /// ## Errors
    /// * `GpuError::WorkerPanicked` - If the worker panicked (protocol violation).
    /// * The fatal error that stopped the worker, if any.
    pub fn join(mut self) -> Result<(), GpuError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), GpuError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        if let Some(sender) = self.sender.take() {
            if !self.shared.stopped.load(Ordering::SeqCst) {
                self.shared.task_enqueued();
                if sender.send(AsyncTask::Terminate).is_err() {
                    self.shared.tasks_retired(1);
                }
            }
        }
        if handle.join().is_err() {
            log::error!("{} panicked.", self.config.thread_name);
            return Err(GpuError::WorkerPanicked);
        }
        match self.shared.fatal() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl<D: GraphicsDevice> Drop for AsyncComputeThread<D> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("{} stopped with an error: {e}", self.config.thread_name);
        }
    }
}

impl<D: GraphicsDevice> std::fmt::Debug for AsyncComputeThread<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncComputeThread")
            .field("thread_name", &self.config.thread_name)
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish()
    }
}

/// The state owned by the worker thread.
struct Worker<D: GraphicsDevice> {
    device: Arc<D>,
    counter: Arc<D::CompletionCounter>,
    shared: Arc<Shared>,
    config: AsyncComputeConfig,
    listeners: Vec<Arc<dyn SubmissionListener>>,
    queue: Option<D::Queue>,
    active: Option<PooledContext<D::CommandBuffer>>,
    pool: RecordingContextPool<D::CommandBuffer>,
    completions: CompletionQueue,
    /// Recording tasks executed since the last submission.
    recording: u64,
    next_sync_point: SyncPoint,
}

impl<D: GraphicsDevice> Worker<D> {
    fn run(mut self, receiver: Receiver<AsyncTask<D>>) {
        let _guard = StopGuard(self.shared.clone());
        let poll_interval = self.config.completion_poll_interval();

        loop {
            let task = if self.completions.is_empty() {
                receiver.recv().ok()
            } else {
                match receiver.recv_timeout(poll_interval) {
                    Ok(task) => Some(task),
                    Err(RecvTimeoutError::Timeout) => {
                        self.drain_completions();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => None,
                }
            };

            // Every producer is gone: behave as if terminated.
            let Some(task) = task else {
                if let Err(e) = self.terminate() {
                    self.fail(e);
                }
                break;
            };

            self.drain_completions();

            log::trace!("{} executing {task:?}", self.config.thread_name);
            let terminate = matches!(task, AsyncTask::Terminate);
            let stop = match self.execute(task) {
                Ok(()) => terminate,
                Err(e) => {
                    self.fail(e);
                    true
                }
            };
            // The fatal error is published before the task counts as executed.
            self.shared.tasks_retired(1);
            if stop {
                break;
            }
        }

        let dropped = receiver.drain().count();
        if dropped > 0 {
            log::warn!(
                "{} dropped {dropped} tasks enqueued after it stopped.",
                self.config.thread_name
            );
        }
        log::info!("{} stopped.", self.config.thread_name);
    }

    fn fail(&mut self, error: GpuError) {
        log::error!("{}: fatal GPU error: {error}", self.config.thread_name);
        let device_lost = error == GpuError::DeviceLost;
        self.shared.set_fatal(error);
        self.completions.clear();

        // A lost device reads nothing anymore. Otherwise the GPU keeps running
        // the submitted contexts.
        if device_lost {
            self.release_contexts();
            return;
        }
        let target = self.counter.sync_point();
        match self
            .counter
            .wait_for(target, self.config.terminate_timeout())
        {
            Err(GpuError::DeviceLost) => {
                self.release_contexts();
            }
            Err(e) => {
                log::warn!(
                    "{}: could not wait for {target} after a fatal error: {e}",
                    self.config.thread_name
                );
                self.release_settled();
            }
            Ok(_) => {
                self.release_settled();
            }
        }
    }

    fn drain_completions(&mut self) {
        if self.completions.is_empty() {
            return;
        }
        let fired = self.completions.drain(self.counter.completion_value());
        self.shared
            .callbacks_fired
            .fetch_add(fired as u64, Ordering::Relaxed);
    }

    fn execute(&mut self, task: AsyncTask<D>) -> Result<(), GpuError> {
        match task {
            AsyncTask::SetQueue(queue) => {
                if let Some(mut previous) = self.queue.replace(queue) {
                    if !previous.wait_idle(self.config.terminate_timeout())?.is_complete() {
                        log::warn!("Replaced queue was still busy after the drain timeout.");
                    }
                }
                Ok(())
            }

            AsyncTask::QueueOperation(operation) => {
                let Some(queue) = self.queue.as_mut() else {
                    panic!("QueueOperation executed before SetQueue");
                };
                operation(queue)
            }

            AsyncTask::BeginRecording => {
                if self.active.is_none() {
                    let completed = self.counter.completion_value();
                    let device = &self.device;
                    let context = self
                        .pool
                        .request(completed, |name| device.create_command_buffer(Some(name)))?;
                    if context.was_recycled() {
                        self.shared.contexts_reused.fetch_add(1, Ordering::Relaxed);
                    } else {
                        self.shared.contexts_created.fetch_add(1, Ordering::Relaxed);
                    }
                    self.active = Some(context);
                }
                let context = self.active_context("BeginRecording");
                assert!(
                    context.state() != CommandBufferState::Recording,
                    "BeginRecording while the command buffer is already recording"
                );
                context.begin()
            }

            AsyncTask::Recording(recording) => {
                let next_sync_point = self.next_sync_point;
                let context = self.active_context("Recording");
                assert_eq!(
                    context.state(),
                    CommandBufferState::Recording,
                    "Recording without BeginRecording"
                );
                recording(next_sync_point, context);
                self.recording += 1;
                Ok(())
            }

            AsyncTask::EndRecording => {
                let context = self.active_context("EndRecording");
                assert_eq!(
                    context.state(),
                    CommandBufferState::Recording,
                    "EndRecording without BeginRecording"
                );
                context.end()
            }

            AsyncTask::Submitting => self.submit(),

            AsyncTask::ExecutionCompleted(callback) => {
                self.completions.push(self.next_sync_point, callback);
                Ok(())
            }

            AsyncTask::Terminate => self.terminate(),
        }
    }

    fn active_context(&mut self, task: &str) -> &mut D::CommandBuffer {
        match self.active.as_mut() {
            Some(context) => &mut **context,
            None => panic!("{task} without BeginRecording"),
        }
    }

    fn submit(&mut self) -> Result<(), GpuError> {
        if self.recording == 0 {
            log::trace!("Nothing recorded since the last submission.");
            return Ok(());
        }
        self.recording = 0;

        let Some(mut context) = self.active.take() else {
            panic!("Submitting without BeginRecording");
        };
        assert_eq!(
            context.state(),
            CommandBufferState::Executable,
            "Submitting without EndRecording"
        );
        let Some(queue) = self.queue.as_mut() else {
            panic!("Submitting before SetQueue");
        };

        if let Err(e) = queue.submit(&mut [&mut *context], &[self.counter.as_ref()], None) {
            self.pool.release(context);
            return Err(e);
        }

        let submitted = self.counter.sync_point();
        self.pool.discard(submitted, context);
        self.next_sync_point = submitted.next();
        self.shared.native_submits.fetch_add(1, Ordering::Relaxed);

        let completed = self.counter.completion_value();
        log::debug!("Submitted {submitted} (completed: {completed}).");
        for listener in &self.listeners {
            listener.on_submitted(submitted, completed);
        }
        Ok(())
    }

    fn terminate(&mut self) -> Result<(), GpuError> {
        let target = self.counter.sync_point();
        let status = self
            .counter
            .wait_for(target, self.config.terminate_timeout())?;
        if !status.is_complete() {
            log::warn!(
                "Terminating before the GPU reached {target} (completed: {}).",
                self.counter.completion_value()
            );
        }

        self.drain_completions();
        let dropped = self.completions.clear();
        if dropped > 0 {
            log::warn!("Dropped {dropped} completion callbacks that were never reached.");
        }

        let released = self.release_settled();
        log::debug!("Released {released} recording contexts.");
        Ok(())
    }

    /// Releases the active context and every pooled context the GPU is done
    /// with. Contexts it may still execute are leaked.
    fn release_settled(&mut self) -> usize {
        let mut released = 0;
        if let Some(context) = self.active.take() {
            self.pool.release(context);
            released += 1;
        }
        let completed = self.counter.completion_value();
        released += self.pool.release_reached(completed);

        let leaked = self.pool.forget_pending();
        if leaked > 0 {
            log::warn!(
                "{}: leaked {leaked} recording contexts the GPU had not finished (completed: {completed}).",
                self.config.thread_name
            );
        }
        released
    }

    fn release_contexts(&mut self) -> usize {
        let mut released = 0;
        if let Some(context) = self.active.take() {
            self.pool.release(context);
            released += 1;
        }
        released + self.pool.release_all()
    }
}
