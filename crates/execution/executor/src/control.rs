// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::billing::{Clock, ResourceGuard};
use serde_derive::{Deserialize, Serialize};
use std::{collections::BTreeSet, sync::Arc, time::Duration};
use wasm_vm_types::{self as vm, InlineTransaction, Name, Spec, H256};

/// A signed contract transaction. Signature verification happens before
/// execution, so `signers` holds already verified accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasmContractTx {
    pub trx_id: H256,
    pub signers: BTreeSet<Name>,
    pub inline_transactions: Vec<InlineTransaction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Checking a transaction before admitting it to the pool.
    Validating,
    /// Producing or replaying a block.
    Mining,
}

/// Transaction-wide execution state shared by every context of one
/// transaction.
pub struct ControlTransaction {
    trx_id: H256,
    signers: BTreeSet<Name>,
    status: TransactionStatus,
    block_time: u64,
    contracts_console: bool,
    resources: ResourceGuard,
    recipients_size: u32,
}

impl ControlTransaction {
    pub fn new(
        tx: &WasmContractTx, status: TransactionStatus, block_time: u64,
        spec: &Spec, clock: Arc<dyn Clock>,
    ) -> Self {
        ControlTransaction {
            trx_id: tx.trx_id,
            signers: tx.signers.clone(),
            status,
            block_time,
            contracts_console: spec.contracts_console
                && status == TransactionStatus::Validating,
            resources: ResourceGuard::new(
                clock,
                spec.max_transaction_duration(),
            ),
            recipients_size: 0,
        }
    }

    pub fn trx_id(&self) -> H256 { self.trx_id }

    pub fn signers(&self) -> &BTreeSet<Name> { &self.signers }

    pub fn status(&self) -> TransactionStatus { self.status }

    pub fn block_time(&self) -> u64 { self.block_time }

    pub fn contracts_console(&self) -> bool { self.contracts_console }

    /// Number of receiver executions so far, notifications included.
    pub fn recipients_size(&self) -> u32 { self.recipients_size }

    pub(crate) fn inc_recipients_size(&mut self) { self.recipients_size += 1; }

    pub fn resources(&self) -> &ResourceGuard { &self.resources }

    pub(crate) fn resources_mut(&mut self) -> &mut ResourceGuard {
        &mut self.resources
    }

    pub fn now(&self) -> Duration { self.resources.timer().now() }

    pub fn billed_duration(&self) -> Duration {
        self.resources.timer().billed()
    }

    pub fn get_max_transaction_duration(&self) -> Duration {
        self.resources.timer().max_duration()
    }

    pub fn pause_billing_timer(&mut self) -> vm::Result<()> {
        self.resources.pause_billing_timer()
    }

    pub fn resume_billing_timer(&mut self) -> vm::Result<()> {
        self.resources.resume_billing_timer()
    }

    pub fn checktime(&self) -> vm::Result<()> { self.resources.checktime() }

    pub fn update_storage_usage(&mut self, account: Name, delta: i64) {
        self.resources.update_storage_usage(account, delta)
    }
}
