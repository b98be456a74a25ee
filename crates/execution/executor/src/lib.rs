// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Contract execution engine.
//!
//! [`WasmExecutive`] runs the actions of a transaction. Each action gets a
//! [`WasmContext`] that exposes the host surface to the interpreter, dispatches
//! notifications and drains the inline actions scheduled by contract code.

#[macro_use]
extern crate log;

pub mod authorization;
pub mod billing;
pub mod context;
pub mod control;
pub mod executive;
pub mod machine;
pub mod native;
pub mod state;
pub mod trace;

pub use self::{
    authorization::AuthorizationChecker,
    billing::{BillingTimer, Clock, ResourceGuard, SystemClock},
    context::{ContextStatus, WasmContext},
    control::{ControlTransaction, TransactionStatus, WasmContractTx},
    executive::{Env, Executed, ExecutionOutcome, WasmExecutive},
    machine::{Machine, WasmInterface},
    native::{NativeContractMap, NativeHandler},
    state::{Account, RegId, StateCache},
    trace::{InlineTransactionTrace, TraceError, TransactionTrace},
};

#[cfg(any(test, feature = "testonly_code"))]
pub use self::{billing::ManualClock, machine::ScriptedVm, state::MemoryState};
