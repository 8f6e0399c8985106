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


//! The async compute worker: one dedicated thread that owns the submission queue.
//!
//! Every interaction with the GPU queue (setting it, recording into the active
//! command buffer, submitting, waiting for completion) is funneled through a
//! single FIFO of [`AsyncTask`]s consumed by one thread. Producers on any thread
//! get a total order of recording and submission operations, and the native
//! queue and command memory are never touched from two threads at once.

mod completion;
mod task;
mod thread;

pub use self::completion::CompletionQueue;
pub use self::task::{
    AsyncTask, AsyncTaskType, CompletionCallback, QueueOperation, RecordingCallback,
};
pub use self::thread::AsyncComputeThread;

use crate::renderer::api::SyncPoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the [`AsyncComputeThread`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsyncComputeConfig {
    /// Name given to the worker OS thread.
    pub thread_name: String,
    /// While completion callbacks are pending and no task arrives, the worker
    /// re-checks the completion counter at this interval.
    pub completion_poll_interval_ms: u64,
    /// Upper bound on how long `Terminate`, or a fatal error other than device
    /// loss, waits for in-flight GPU work. Contexts the GPU has not finished by
    /// then are leaked, never freed.
    pub terminate_timeout_ms: u64,
    /// Upper bound on how long `wait_idle()` waits for the GPU.
    pub wait_idle_timeout_ms: u64,
}

impl AsyncComputeConfig {
    /// The idle completion poll interval as a [`Duration`].
    pub fn completion_poll_interval(&self) -> Duration {
        Duration::from_millis(self.completion_poll_interval_ms.max(1))
    }

    /// The terminate drain timeout as a [`Duration`].
    pub fn terminate_timeout(&self) -> Duration {
        Duration::from_millis(self.terminate_timeout_ms)
    }

    /// The wait-idle timeout as a [`Duration`].
    pub fn wait_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_idle_timeout_ms)
    }
}

impl Default for AsyncComputeConfig {
    fn default() -> Self {
        Self {
            thread_name: "AsyncComputeThread".to_string(),
            completion_poll_interval_ms: 1,
            terminate_timeout_ms: 5_000,
            wait_idle_timeout_ms: 0xffff_ffff,
        }
    }
}

/// Observes every native submission performed by the worker.
///
/// Listeners run on the worker thread right after the submit call returns, so
/// they must be quick. The [`DescriptorPool`](crate::renderer::DescriptorPool)
/// uses this hook to retire and recycle its blocks.
pub trait SubmissionListener: Send + Sync {
    /// Called after a submission that will signal `submitted`, with the
    /// completion value observed at that moment.
    fn on_submitted(&self, submitted: SyncPoint, completed: SyncPoint);
}

/// Diagnostic counters of an [`AsyncComputeThread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmissionStats {
    /// Native submit calls performed.
    pub native_submits: u64,
    /// Recording contexts created because none could be recycled.
    pub contexts_created: u64,
    /// Recording contexts reset and reused.
    pub contexts_reused: u64,
    /// Completion callbacks invoked.
    pub callbacks_fired: u64,
}
