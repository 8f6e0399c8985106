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


//! Backend-agnostic data types shared by every graphics backend.

pub mod backend;
pub mod command;
pub mod common;
pub mod descriptor;
pub mod handle;
pub mod sync;

pub use self::backend::{BackendDriver, BackendSelectionConfig, BackendSelectionResult};
pub use self::command::{CommandBufferState, PresentStatus, QueueType};
pub use self::common::{GraphicsAdapterInfo, GraphicsBackendType, RendererDeviceType};
pub use self::descriptor::{
    BufferId, DescriptorBlock, DescriptorEntry, DescriptorHeapDescriptor, DescriptorHeapKind,
    DescriptorRange, SamplerId, TextureViewId,
};
pub use self::handle::Handle;
pub use self::sync::{SyncPoint, WaitStatus};
