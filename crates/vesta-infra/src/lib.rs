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


//! # Vesta Infra
//!
//! Concrete implementations of the `vesta-core` graphics contracts: a `wgpu`
//! backend for real GPUs and an emulated backend family reproducing the queue
//! semantics of each native API on a CPU timeline.

#![warn(missing_docs)]

pub mod graphics;

pub use graphics::{ActiveBackend, EmulatedConfig, EmulatedDevice, EmulatedVariant};

#[cfg(feature = "graphics")]
pub use graphics::WgpuDevice;
