// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use std::{collections::HashMap, sync::Arc};
use wasm_vm_types::{self as vm, Context, Name};

pub type NativeHandler =
    Arc<dyn Fn(&mut dyn Context) -> vm::Result<()> + Send + Sync>;

/// Actions implemented by the node itself. A registered handler replaces the
/// bytecode of its receiver for that action.
#[derive(Default, Clone)]
pub struct NativeContractMap {
    handlers: HashMap<(Name, Name), NativeHandler>,
}

impl NativeContractMap {
    pub fn register<F>(&mut self, receiver: Name, action: Name, handler: F)
    where F: Fn(&mut dyn Context) -> vm::Result<()> + Send + Sync + 'static {
        self.handlers.insert((receiver, action), Arc::new(handler));
    }

    pub fn get(&self, receiver: Name, action: Name) -> Option<&NativeHandler> {
        self.handlers.get(&(receiver, action))
    }

    pub fn contains(&self, receiver: Name, action: Name) -> bool {
        self.handlers.contains_key(&(receiver, action))
    }

    pub fn len(&self) -> usize { self.handlers.len() }

    pub fn is_empty(&self) -> bool { self.handlers.is_empty() }
}
