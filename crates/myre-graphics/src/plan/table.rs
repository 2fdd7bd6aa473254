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

use crate::resource::{Finaliser, ResourceInfo};
use myre_core::renderer::TextureId;
use std::collections::HashMap;

/// What one component declared when it was initialised, plus the resources
/// that die once it has drawn.
#[derive(Debug)]
pub(crate) struct StepDeclaration {
    pub(crate) name: String,
    pub(crate) inputs: Vec<String>,
    pub(crate) outputs: Vec<ResourceInfo>,
    pub(crate) finalise_after: Vec<String>,
}

impl StepDeclaration {
    pub(crate) fn output(&self, name: &str) -> Option<&ResourceInfo> {
        self.outputs.iter().find(|output| output.name == name)
    }

    pub(crate) fn reads(&self, name: &str) -> bool {
        self.inputs.iter().any(|input| input == name)
    }

    /// Returns `true` if the step reads or writes `name`.
    pub(crate) fn declares(&self, name: &str) -> bool {
        self.reads(name) || self.output(name).is_some()
    }
}

#[derive(Debug)]
pub(crate) struct LiveResource {
    pub(crate) target: TextureId,
    pub(crate) finaliser: Finaliser,
}

/// The targets currently satisfying each resource name during one execution.
#[derive(Debug, Default)]
pub(crate) struct ResourceTable {
    entries: HashMap<String, LiveResource>,
}

impl ResourceTable {
    pub(crate) fn get(&self, name: &str) -> Option<&LiveResource> {
        self.entries.get(name)
    }

    /// Sets the target of `name`, returning the entry it replaces.
    pub(crate) fn publish(
        &mut self,
        name: &str,
        target: TextureId,
        finaliser: Finaliser,
    ) -> Option<LiveResource> {
        self.entries
            .insert(name.to_owned(), LiveResource { target, finaliser })
    }

    pub(crate) fn take(&mut self, name: &str) -> Option<LiveResource> {
        self.entries.remove(name)
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (String, LiveResource)> + '_ {
        self.entries.drain()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
