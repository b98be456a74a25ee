// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::trace::TransactionTrace;
use serde_derive::Serialize;
use std::collections::BTreeMap;
use wasm_vm_types::{Name, Receipt, WasmException};

/// Effects of a transaction that executed to the end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Executed {
    pub trace: TransactionTrace,
    pub receipts: Vec<Receipt>,
    /// Net storage bytes charged per account.
    pub storage_usage: BTreeMap<Name, i64>,
}

#[derive(Debug)]
pub enum ExecutionOutcome {
    /// Every state change was discarded. The trace shows how far execution
    /// got.
    ExecutionError {
        error: WasmException,
        trace: TransactionTrace,
    },
    Finished(Executed),
}
use ExecutionOutcome::*;

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool { matches!(self, Finished(_)) }

    pub fn error(&self) -> Option<&WasmException> {
        match self {
            ExecutionError { error, .. } => Some(error),
            Finished(_) => None,
        }
    }

    pub fn trace(&self) -> &TransactionTrace {
        match self {
            ExecutionError { trace, .. } => trace,
            Finished(executed) => &executed.trace,
        }
    }

    pub fn successfully_executed(self) -> Option<Executed> {
        match self {
            Finished(executed) => Some(executed),
            ExecutionError { .. } => None,
        }
    }
}
