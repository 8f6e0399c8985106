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


use crate::renderer::api::SyncPoint;
use crate::renderer::error::GpuError;
use crate::renderer::traits::GraphicsDevice;
use std::fmt;

/// A closure run against the worker's queue (waits, signals, presents).
pub type QueueOperation<D> =
    Box<dyn FnOnce(&mut <D as GraphicsDevice>::Queue) -> Result<(), GpuError> + Send>;

/// A closure recording commands into the active command buffer. It receives the
/// sync point the recorded work will complete at.
pub type RecordingCallback<D> =
    Box<dyn FnOnce(SyncPoint, &mut <D as GraphicsDevice>::CommandBuffer) + Send>;

/// A closure run on the worker thread once submitted work has completed.
pub type CompletionCallback = Box<dyn FnOnce() + Send>;

/// The kind of an [`AsyncTask`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AsyncTaskType {
    /// See [`AsyncTask::SetQueue`].
    SetQueue,
    /// See [`AsyncTask::QueueOperation`].
    QueueOperation,
    /// See [`AsyncTask::BeginRecording`].
    BeginRecording,
    /// See [`AsyncTask::Recording`].
    Recording,
    /// See [`AsyncTask::EndRecording`].
    EndRecording,
    /// See [`AsyncTask::Submitting`].
    Submitting,
    /// See [`AsyncTask::ExecutionCompleted`].
    ExecutionCompleted,
    /// See [`AsyncTask::Terminate`].
    Terminate,
}

/// A unit of work for the [`AsyncComputeThread`](super::AsyncComputeThread).
///
/// Tasks are executed in enqueue order, one at a time, on the worker thread.
pub enum AsyncTask<D: GraphicsDevice> {
    /// Hands the submission queue to the worker. A previously set queue is
    /// drained with `wait_idle` and dropped.
    SetQueue(D::Queue),
    /// Runs a closure against the current queue.
    ///
    /// # Panics
    /// The worker panics if no queue was set.
    QueueOperation(QueueOperation<D>),
    /// Acquires a command buffer, recycling a completed one when possible,
    /// and begins recording.
    BeginRecording,
    /// Records commands into the active command buffer.
    ///
    /// # Panics
    /// The worker panics if recording was not begun.
    Recording(RecordingCallback<D>),
    /// Ends recording on the active command buffer.
    ///
    /// # Panics
    /// The worker panics if recording was not begun.
    EndRecording,
    /// Submits the active command buffer, signaling the worker's completion
    /// counter. Does nothing if nothing was recorded since the last submission.
    ///
    /// # Panics
    /// The worker panics if recording was not ended, or if no queue was set.
    Submitting,
    /// Runs a callback once the next submission has completed on the GPU.
    ExecutionCompleted(CompletionCallback),
    /// Waits for in-flight work, releases every recording context the GPU is
    /// done with and stops the worker. Tasks enqueued after it are dropped.
    Terminate,
}

impl<D: GraphicsDevice> AsyncTask<D> {
    /// Returns the kind of this task.
    pub fn kind(&self) -> AsyncTaskType {
        match self {
            AsyncTask::SetQueue(_) => AsyncTaskType::SetQueue,
            AsyncTask::QueueOperation(_) => AsyncTaskType::QueueOperation,
            AsyncTask::BeginRecording => AsyncTaskType::BeginRecording,
            AsyncTask::Recording(_) => AsyncTaskType::Recording,
            AsyncTask::EndRecording => AsyncTaskType::EndRecording,
            AsyncTask::Submitting => AsyncTaskType::Submitting,
            AsyncTask::ExecutionCompleted(_) => AsyncTaskType::ExecutionCompleted,
            AsyncTask::Terminate => AsyncTaskType::Terminate,
        }
    }
}

impl<D: GraphicsDevice> fmt::Debug for AsyncTask<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AsyncTask::{:?}", self.kind())
    }
}
