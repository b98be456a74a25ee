// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

#[cfg(any(test, feature = "testonly_code"))]
mod scripted;

#[cfg(any(test, feature = "testonly_code"))]
pub use scripted::ScriptedVm;

use crate::native::NativeContractMap;
use std::sync::Arc;
use wasm_vm_types::{Context, Spec};

/// The bytecode interpreter. It runs `code` for the receiver of `context` and
/// reaches the host only through `context`.
pub trait WasmInterface: Send + Sync {
    fn execute(&self, code: &[u8], context: &mut dyn Context)
        -> anyhow::Result<()>;
}

/// Everything a context needs besides the transaction and the state: limits,
/// the interpreter and native actions. Shared by all contexts of a block.
pub struct Machine {
    spec: Spec,
    vm: Arc<dyn WasmInterface>,
    native_contracts: Arc<NativeContractMap>,
}

impl Machine {
    pub fn new(spec: Spec, vm: Arc<dyn WasmInterface>) -> Machine {
        Machine {
            spec,
            vm,
            native_contracts: Arc::new(NativeContractMap::default()),
        }
    }

    pub fn new_with_native_contracts(
        spec: Spec, vm: Arc<dyn WasmInterface>,
        native_contracts: NativeContractMap,
    ) -> Machine {
        Machine {
            spec,
            vm,
            native_contracts: Arc::new(native_contracts),
        }
    }

    pub fn spec(&self) -> &Spec { &self.spec }

    pub fn wasm_interface(&self) -> &dyn WasmInterface { &*self.vm }

    pub fn native_contracts(&self) -> &NativeContractMap {
        &self.native_contracts
    }
}
