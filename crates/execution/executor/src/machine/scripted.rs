// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use super::WasmInterface;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use wasm_vm_types::{Bytes, Context, Name};

type Script = Arc<dyn Fn(&mut dyn Context) -> anyhow::Result<()> + Send + Sync>;

/// An interpreter whose "bytecode" is a Rust closure registered per
/// (receiver, action). Receivers without a script for the action do nothing.
#[derive(Default)]
pub struct ScriptedVm {
    scripts: HashMap<(Name, Name), Script>,
    calls: Mutex<Vec<(Name, Name, Bytes)>>,
}

impl ScriptedVm {
    pub fn new() -> Self { Self::default() }

    pub fn with_script<F>(mut self, receiver: &str, action: &str, f: F) -> Self
    where F: Fn(&mut dyn Context) -> anyhow::Result<()> + Send + Sync + 'static
    {
        let key = (parse(receiver), parse(action));
        self.scripts.insert(key, Arc::new(f));
        self
    }

    /// (receiver, action, code) of every invocation, in order.
    pub fn calls(&self) -> Vec<(Name, Name, Bytes)> {
        self.calls.lock().clone()
    }

    pub fn receivers(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|(receiver, _, _)| receiver.to_string())
            .collect()
    }
}

fn parse(s: &str) -> Name {
    match s.parse() {
        Ok(name) => name,
        Err(e) => panic!("invalid name {:?} in script: {}", s, e),
    }
}

impl WasmInterface for ScriptedVm {
    fn execute(
        &self, code: &[u8], context: &mut dyn Context,
    ) -> anyhow::Result<()> {
        let key = (context.receiver(), context.action());
        self.calls.lock().push((key.0, key.1, code.to_vec()));
        let script = self.scripts.get(&key).cloned();
        match script {
            Some(script) => script(context),
            None => Ok(()),
        }
    }
}
