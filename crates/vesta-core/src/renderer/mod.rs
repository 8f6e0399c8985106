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


//! Provides the public, backend-agnostic GPU submission contracts.
//!
//! This module defines the "common language" every backend speaks: the abstract
//! `traits` (like [`GraphicsDevice`] and [`Queue`]), the small data types shared
//! between them (like [`SyncPoint`]) and the error type raised at the backend
//! boundary.
//!
//! On top of those contracts it builds the lifetime-tracking engine: the
//! [`pool`] module recycles recording contexts and descriptor blocks only once
//! the GPU is done with them, and [`async_compute`] funnels all queue work
//! through a single worker thread. The concrete backends live in `vesta-infra`.

pub mod api;
pub mod async_compute;
pub mod error;
pub mod pool;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::async_compute::{
    AsyncComputeConfig, AsyncComputeThread, AsyncTask, AsyncTaskType, CompletionQueue,
    SubmissionListener, SubmissionStats,
};
pub use self::error::{ConfigError, GpuError};
pub use self::pool::{DescriptorPool, DescriptorPoolConfig, PooledContext, RecordingContextPool};
pub use self::traits::{
    CommandBuffer, CompletionCounter, DescriptorHeap, GraphicsDevice, Queue, RecordingContext,
    Swapchain,
};
