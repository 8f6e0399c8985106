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


//! Defines the error types raised at the GPU layer boundary.
//!
//! Every native return code is translated into a [`GpuError`] at the call site.
//! A `GpuError` is fatal for the submission engine: the async compute worker
//! stops on the first one and hands it back through `wait_idle()` / `join()`.

use std::fmt;

/// A fatal error surfaced by a graphics backend or by the submission engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
    /// The graphics device was lost (driver crash, removal, reset).
    /// There is no automatic device recreation.
    DeviceLost,
    /// The backend refused a command list submission.
    SubmissionFailed(String),
    /// A native allocation (command memory, descriptor heap, semaphore...) failed.
    AllocationFailed(String),
    /// A blocking wait ran out of time before the GPU reached the awaited value.
    Timeout {
        /// The sync point that was awaited.
        awaited: u64,
        /// The completion value observed when the wait gave up.
        completed: u64,
    },
    /// A generation-checked handle referenced a slot that has since been recycled.
    InvalidHandle,
    /// The swapchain no longer matches its surface and must be resized.
    SwapchainOutOfDate,
    /// An operation was attempted before the backend was initialized.
    NotInitialized,
    /// The async compute worker thread panicked (usually a protocol violation).
    WorkerPanicked,
    /// The async compute worker has already stopped and accepts no more work.
    WorkerStopped,
    /// An error originating from the specific graphics backend implementation.
    Backend(String),
    /// An unexpected or internal error occurred.
    Internal(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::DeviceLost => write!(
                f,
                "The graphics device was lost and cannot be used anymore."
            ),
            GpuError::SubmissionFailed(msg) => write!(f, "Command submission failed: {msg}"),
            GpuError::AllocationFailed(msg) => write!(f, "GPU allocation failed: {msg}"),
            GpuError::Timeout { awaited, completed } => write!(
                f,
                "Timed out waiting for sync point {awaited} (completed: {completed})"
            ),
            GpuError::InvalidHandle => write!(f, "Invalid or recycled resource handle."),
            GpuError::SwapchainOutOfDate => {
                write!(f, "The swapchain is out of date and must be recreated.")
            }
            GpuError::NotInitialized => write!(f, "The graphics backend is not initialized."),
            GpuError::WorkerPanicked => write!(f, "The async compute thread panicked."),
            GpuError::WorkerStopped => {
                write!(f, "The async compute thread has stopped accepting work.")
            }
            GpuError::Backend(msg) => write!(f, "Backend-specific error: {msg}"),
            GpuError::Internal(msg) => {
                write!(f, "An internal or unexpected error occurred: {msg}")
            }
        }
    }
}

impl std::error::Error for GpuError {}

/// An error raised while loading or parsing a [`SessionConfig`](crate::SessionConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io {
        /// The path that failed to load.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The configuration text is not valid RON for the expected schema.
    Parse(String),
    /// The configuration parsed but holds an unusable value.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read configuration from '{path}': {source}")
            }
            ConfigError::Parse(msg) => write!(f, "Failed to parse configuration: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
