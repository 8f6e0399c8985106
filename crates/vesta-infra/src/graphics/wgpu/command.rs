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


use vesta_core::renderer::{CommandBuffer, CommandBufferState, GpuError, RecordingContext};

/// A recording context wrapping a `wgpu::CommandEncoder`.
///
/// `wgpu` consumes command buffers on submission, so the encoder is created
/// by `begin` and turned into a `wgpu::CommandBuffer` by `end`.
#[derive(Debug)]
pub struct WgpuCommandBuffer {
    device: wgpu::Device,
    label: Option<String>,
    state: CommandBufferState,
    encoder: Option<wgpu::CommandEncoder>,
    finished: Option<wgpu::CommandBuffer>,
}

impl WgpuCommandBuffer {
    pub(crate) fn new(device: wgpu::Device, label: Option<&str>) -> Self {
        Self {
            device,
            label: label.map(str::to_string),
            state: CommandBufferState::Initial,
            encoder: None,
            finished: None,
        }
    }

    /// The encoder to record into, between `begin` and `end`.
    pub fn encoder(&mut self) -> Option<&mut wgpu::CommandEncoder> {
        self.encoder.as_mut()
    }

    pub(crate) fn take_finished(&mut self) -> Option<wgpu::CommandBuffer> {
        self.finished.take()
    }

    pub(crate) fn mark_pending(&mut self) {
        self.state = CommandBufferState::Pending;
    }
}

impl RecordingContext for WgpuCommandBuffer {
    fn reset(&mut self) -> Result<(), GpuError> {
        self.encoder = None;
        self.finished = None;
        self.state = CommandBufferState::Initial;
        Ok(())
    }
}

impl CommandBuffer for WgpuCommandBuffer {
    fn begin(&mut self) -> Result<(), GpuError> {
        if !matches!(
            self.state,
            CommandBufferState::Initial | CommandBufferState::Executable
        ) {
            return Err(GpuError::Internal(format!(
                "cannot begin recording a command buffer in the {:?} state",
                self.state
            )));
        }
        self.finished = None;
        self.encoder = Some(
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: self.label.as_deref(),
                }),
        );
        self.state = CommandBufferState::Recording;
        Ok(())
    }

    fn end(&mut self) -> Result<(), GpuError> {
        let encoder = self.encoder.take().ok_or_else(|| {
            GpuError::Internal(format!(
                "cannot end a command buffer in the {:?} state",
                self.state
            ))
        })?;
        self.finished = Some(encoder.finish());
        self.state = CommandBufferState::Executable;
        Ok(())
    }

    fn state(&self) -> CommandBufferState {
        self.state
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
