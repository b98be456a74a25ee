// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

mod execution_outcome;

pub use execution_outcome::{Executed, ExecutionOutcome};

use crate::{
    authorization::AuthorizationChecker,
    billing::{Clock, SystemClock},
    context::WasmContext,
    control::{ControlTransaction, TransactionStatus, WasmContractTx},
    machine::Machine,
    state::StateCache,
    trace::{InlineTransactionTrace, TransactionTrace},
};
use std::sync::Arc;
use wasm_vm_types::{self as vm, wasm_assert, Receipt};

/// Block-level facts visible to every action of a transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Env {
    pub block_time: u64,
}

/// Executes contract transactions against a state. All effects of a
/// transaction are applied atomically: a failure anywhere in its call tree
/// reverts the state to where it was before the transaction.
pub struct WasmExecutive<'a> {
    state: &'a mut dyn StateCache,
    machine: &'a Machine,
    env: Env,
    clock: Arc<dyn Clock>,
}

impl<'a> WasmExecutive<'a> {
    pub fn new(
        state: &'a mut dyn StateCache, machine: &'a Machine, env: Env,
    ) -> Self {
        WasmExecutive {
            state,
            machine,
            env,
            clock: Arc::new(SystemClock::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn transact(
        &mut self, tx: &WasmContractTx, status: TransactionStatus,
    ) -> ExecutionOutcome {
        let mut control_trx = ControlTransaction::new(
            tx,
            status,
            self.env.block_time,
            self.machine.spec(),
            self.clock.clone(),
        );
        let mut receipts = Vec::new();
        let mut traces = Vec::new();

        self.state.checkpoint();
        let result = self.execute_actions(
            tx,
            &mut control_trx,
            &mut receipts,
            &mut traces,
        );
        let trace = TransactionTrace {
            trx_id: tx.trx_id,
            elapsed: control_trx.billed_duration(),
            traces,
        };

        match result {
            Ok(()) => {
                self.state.discard_checkpoint();
                trace!(
                    target: "wasm",
                    "tx {:?} executed, {} receipts",
                    tx.trx_id, receipts.len()
                );
                ExecutionOutcome::Finished(Executed {
                    trace,
                    receipts,
                    storage_usage: control_trx
                        .resources()
                        .storage_usages()
                        .clone(),
                })
            }
            Err(error) => {
                self.state.revert_to_checkpoint();
                debug!(target: "wasm", "tx {:?} failed: {}", tx.trx_id, error);
                ExecutionOutcome::ExecutionError { error, trace }
            }
        }
    }

    fn execute_actions(
        &mut self, tx: &WasmContractTx, control_trx: &mut ControlTransaction,
        receipts: &mut Vec<Receipt>, traces: &mut Vec<InlineTransactionTrace>,
    ) -> vm::Result<()> {
        wasm_assert!(
            !tx.inline_transactions.is_empty(),
            Transaction,
            "transaction {:?} has no action",
            tx.trx_id
        );

        for (index, trx) in tx.inline_transactions.iter().enumerate() {
            AuthorizationChecker::new(control_trx.signers(), trx.contract)
                .check_transaction(trx)?;

            let mut trace =
                InlineTransactionTrace::new(tx.trx_id, trx, trx.contract);
            let result = WasmContext::new(
                trx,
                &mut *control_trx,
                &mut *self.state,
                &mut *receipts,
                self.machine,
                0,
            )
            .run(&mut trace);
            traces.push(trace);
            if let Err(e) = result {
                return Err(e.rethrow(format!("action {}", index)));
            }
        }
        control_trx.checktime()
    }
}
