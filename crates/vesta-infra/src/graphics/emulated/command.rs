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


use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use vesta_core::renderer::{
    CommandBuffer, CommandBufferState, DescriptorRange, GpuError, RecordingContext,
};

/// A command recorded into an [`EmulatedCommandBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulatedCommand {
    /// A non-indexed draw.
    Draw {
        /// Vertices per instance.
        vertices: u32,
        /// Number of instances.
        instances: u32,
    },
    /// A compute dispatch.
    Dispatch {
        /// Workgroups along X.
        x: u32,
        /// Workgroups along Y.
        y: u32,
        /// Workgroups along Z.
        z: u32,
    },
    /// A full pipeline barrier.
    Barrier,
    /// Binds a descriptor range for the following draws and dispatches.
    BindDescriptors {
        /// Index of the descriptor block.
        block: u32,
        /// First slot inside the block.
        first: u32,
        /// Number of slots.
        count: u32,
    },
    /// A debug marker.
    Marker(String),
}

#[derive(Debug, Default)]
struct MemoryContents {
    generation: u64,
    commands: Vec<EmulatedCommand>,
}

/// The backing memory of a command list, shared with the GPU timeline.
///
/// Resetting bumps the generation; the timeline refuses to execute a
/// submission whose generation no longer matches.
#[derive(Debug, Default)]
pub(crate) struct CommandMemory {
    contents: Mutex<MemoryContents>,
}

impl CommandMemory {
    fn lock(&self) -> MutexGuard<'_, MemoryContents> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn push(&self, command: EmulatedCommand) {
        self.lock().commands.push(command);
    }

    fn reset(&self) {
        let mut contents = self.lock();
        contents.generation += 1;
        contents.commands.clear();
    }

    /// The number of commands recorded, if the memory still holds the
    /// `generation` that was submitted.
    pub(crate) fn read(&self, generation: u64) -> Option<usize> {
        let contents = self.lock();
        (contents.generation == generation).then_some(contents.commands.len())
    }
}

/// A command list of the emulated backend.
#[derive(Debug)]
pub struct EmulatedCommandBuffer {
    label: Option<String>,
    state: CommandBufferState,
    memory: Arc<CommandMemory>,
}

impl EmulatedCommandBuffer {
    pub(crate) fn new(label: Option<&str>) -> Self {
        Self {
            label: label.map(str::to_string),
            state: CommandBufferState::Initial,
            memory: Arc::default(),
        }
    }

    fn push(&mut self, command: EmulatedCommand) {
        assert_eq!(
            self.state,
            CommandBufferState::Recording,
            "commands can only be recorded between begin() and end()"
        );
        self.memory.push(command);
    }

    /// Records a non-indexed draw.
    pub fn draw(&mut self, vertices: u32, instances: u32) {
        self.push(EmulatedCommand::Draw {
            vertices,
            instances,
        });
    }

    /// Records a compute dispatch.
    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.push(EmulatedCommand::Dispatch { x, y, z });
    }

    /// Records a full pipeline barrier.
    pub fn barrier(&mut self) {
        self.push(EmulatedCommand::Barrier);
    }

    /// Binds a descriptor range allocated from a descriptor pool.
    pub fn bind_descriptors(&mut self, range: &DescriptorRange) {
        self.push(EmulatedCommand::BindDescriptors {
            block: range.block.index(),
            first: range.first,
            count: range.count,
        });
    }

    /// Records a debug marker.
    pub fn insert_marker(&mut self, label: &str) {
        self.push(EmulatedCommand::Marker(label.to_string()));
    }

    /// A copy of the commands currently recorded.
    pub fn commands(&self) -> Vec<EmulatedCommand> {
        self.memory.lock().commands.clone()
    }

    /// The memory and generation the GPU will execute.
    pub(crate) fn submission(&self) -> (Arc<CommandMemory>, u64) {
        (self.memory.clone(), self.memory.generation())
    }

    pub(crate) fn mark_pending(&mut self) {
        self.state = CommandBufferState::Pending;
    }
}

impl RecordingContext for EmulatedCommandBuffer {
    fn reset(&mut self) -> Result<(), GpuError> {
        self.memory.reset();
        self.state = CommandBufferState::Initial;
        Ok(())
    }
}

impl CommandBuffer for EmulatedCommandBuffer {
    fn begin(&mut self) -> Result<(), GpuError> {
        match self.state {
            CommandBufferState::Initial => {}
            CommandBufferState::Executable => self.memory.reset(),
            state => {
                return Err(GpuError::Internal(format!(
                    "cannot begin recording a command buffer in the {state:?} state"
                )))
            }
        }
        self.state = CommandBufferState::Recording;
        Ok(())
    }

    fn end(&mut self) -> Result<(), GpuError> {
        if self.state != CommandBufferState::Recording {
            return Err(GpuError::Internal(format!(
                "cannot end a command buffer in the {:?} state",
                self.state
            )));
        }
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
