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


//! Recycling pools for objects the GPU may still be reading.
//!
//! Both pools follow the same rule: an object handed back after a submission is
//! tagged with that submission's [`SyncPoint`](crate::renderer::SyncPoint) and
//! is only reused once a completion counter has reached it. Recycled objects are
//! addressed through generation-checked [`Handle`](crate::renderer::Handle)s so
//! a reference kept past a recycle is detected instead of aliasing the new owner.

mod descriptor_pool;
mod recording_context_pool;

pub use self::descriptor_pool::{DescriptorPool, DescriptorPoolConfig};
pub use self::recording_context_pool::{PooledContext, RecordingContextPool};
