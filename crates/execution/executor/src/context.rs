// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Execution context of one action.
//!
//! A context runs its action on the receiver, then on every recipient the
//! action asked to notify, and finally drains the inline actions scheduled
//! along the way. Each inline action gets a child context one level deeper
//! that borrows the same transaction-wide resources, so the call tree is
//! executed depth first.

use crate::{
    authorization::AuthorizationChecker,
    control::ControlTransaction,
    machine::Machine,
    state::{Account, StateCache},
    trace::InlineTransactionTrace,
};
use std::{mem, sync::Arc, time::Duration};
use wasm_vm_types::{
    self as vm, wasm_assert, wasm_exception, wasm_throw, Bytes, Context,
    ExceptionKind, InlineTransaction, Name, Permission, Receipt, ResultExt,
    WasmAllocator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStatus {
    Created,
    Initialized,
    Executing,
    Completed,
    Failed,
}

pub struct WasmContext<'a> {
    trx: &'a InlineTransaction,
    control_trx: &'a mut ControlTransaction,
    state: &'a mut dyn StateCache,
    receipts: &'a mut Vec<Receipt>,
    machine: &'a Machine,
    recurse_depth: u32,

    receiver: Name,
    code: Option<Arc<Bytes>>,
    /// Receivers of the current action. The first entry is the contract.
    notified: Vec<Name>,
    /// Scheduled inline actions with the receiver that issued them.
    inline_transactions: Vec<(Name, InlineTransaction)>,
    pending_console_output: String,
    pending_receipts: Vec<Receipt>,
    wasm_alloc: WasmAllocator,
    exited: bool,
    status: ContextStatus,
}

impl<'a> WasmContext<'a> {
    pub fn new(
        trx: &'a InlineTransaction, control_trx: &'a mut ControlTransaction,
        state: &'a mut dyn StateCache, receipts: &'a mut Vec<Receipt>,
        machine: &'a Machine, recurse_depth: u32,
    ) -> Self {
        WasmContext {
            trx,
            control_trx,
            state,
            receipts,
            machine,
            recurse_depth,
            receiver: trx.contract,
            code: None,
            notified: Vec::new(),
            inline_transactions: Vec::new(),
            pending_console_output: String::new(),
            pending_receipts: Vec::new(),
            wasm_alloc: WasmAllocator::new(machine.spec().max_wasm_memory),
            exited: false,
            status: ContextStatus::Created,
        }
    }

    pub fn status(&self) -> ContextStatus { self.status }

    pub fn depth(&self) -> u32 { self.recurse_depth }

    pub fn notified(&self) -> &[Name] { &self.notified }

    pub fn pending_inline_transactions(&self) -> Vec<&InlineTransaction> {
        self.inline_transactions.iter().map(|(_, trx)| trx).collect()
    }

    /// Resolves the receiver and loads its code. Native actions need no code.
    pub fn initialize(&mut self) -> vm::Result<()> {
        wasm_assert!(
            self.status == ContextStatus::Created,
            Transaction,
            "context of {}::{} initialized twice",
            self.trx.contract,
            self.trx.action
        );
        self.receiver = self.trx.contract;

        let natives = self.machine.native_contracts();
        if !natives.contains(self.receiver, self.trx.action) {
            match self.get_code(self.receiver) {
                Ok(code) => self.code = Some(Arc::new(code)),
                Err(e) => {
                    self.status = ContextStatus::Failed;
                    return Err(e);
                }
            }
        }
        self.status = ContextStatus::Initialized;
        Ok(())
    }

    /// Initializes and executes, recording an initialization failure on
    /// `trace`.
    pub fn run(
        &mut self, trace: &mut InlineTransactionTrace,
    ) -> vm::Result<()> {
        if let Err(e) = self.initialize() {
            let result = Err(e);
            trace.finalize(&result);
            return result;
        }
        self.execute(trace)
    }

    pub fn execute(
        &mut self, trace: &mut InlineTransactionTrace,
    ) -> vm::Result<()> {
        wasm_assert!(
            self.status == ContextStatus::Initialized,
            Transaction,
            "cannot execute a context in status {:?}",
            self.status
        );
        self.status = ContextStatus::Executing;
        trace!(
            target: "wasm",
            "execute {}::{} depth={}",
            self.trx.contract, self.trx.action, self.recurse_depth
        );

        let result = self.execute_all(trace);
        self.wasm_alloc.free();
        self.status = match result {
            Ok(()) => ContextStatus::Completed,
            Err(_) => ContextStatus::Failed,
        };
        trace.finalize(&result);
        result
    }

    fn execute_all(
        &mut self, trace: &mut InlineTransactionTrace,
    ) -> vm::Result<()> {
        self.notified.push(self.receiver);
        self.execute_one(trace)?;

        let mut i = 1;
        while i < self.notified.len() {
            self.receiver = self.notified[i];
            let mut node = InlineTransactionTrace::new(
                self.control_trx.trx_id(),
                self.trx,
                self.receiver,
            );
            let result = self.execute_notification(&mut node);
            trace.push_inline_trace(node);
            result?;
            i += 1;
        }
        self.receiver = self.trx.contract;

        if self.inline_transactions.is_empty() {
            return Ok(());
        }
        let max_depth = self.machine.spec().max_inline_transaction_depth;
        if self.recurse_depth >= max_depth {
            debug!(
                target: "wasm",
                "{} inline transactions rejected at depth {}",
                self.inline_transactions.len(), self.recurse_depth
            );
            wasm_throw!(
                Transaction,
                "max inline transaction depth per transaction reached, \
                 depth = {}, max = {}",
                self.recurse_depth + 1,
                max_depth
            );
        }

        let queue = mem::take(&mut self.inline_transactions);
        for (index, (issuer, trx)) in queue.iter().enumerate() {
            AuthorizationChecker::new(self.control_trx.signers(), *issuer)
                .check_transaction(trx)?;

            let mut node = InlineTransactionTrace::new(
                self.control_trx.trx_id(),
                trx,
                trx.contract,
            );
            let result = self.execute_inline_transaction(&mut node, trx);
            trace.push_inline_trace(node);
            if let Err(e) = result {
                return Err(e.rethrow(format!(
                    "inline transaction {} of {}::{}",
                    index, self.trx.contract, self.trx.action
                )));
            }
        }
        Ok(())
    }

    fn execute_inline_transaction(
        &mut self, trace: &mut InlineTransactionTrace, trx: &InlineTransaction,
    ) -> vm::Result<()> {
        let mut child = WasmContext::new(
            trx,
            &mut *self.control_trx,
            &mut *self.state,
            &mut *self.receipts,
            self.machine,
            self.recurse_depth + 1,
        );
        child.run(trace)
    }

    /// Runs a notification under a storage checkpoint. A failed recipient is
    /// rolled back and recorded without its receipts; only a timeout aborts
    /// the action.
    fn execute_notification(
        &mut self, trace: &mut InlineTransactionTrace,
    ) -> vm::Result<()> {
        let receipts_len = self.receipts.len();
        let queued = self.inline_transactions.len();
        let notified = self.notified.len();
        let storage = self.control_trx.resources().storage_snapshot();
        self.state.checkpoint();

        let result = self.execute_one(trace);
        match result {
            Ok(()) => self.state.discard_checkpoint(),
            Err(_) => {
                self.state.revert_to_checkpoint();
                self.receipts.truncate(receipts_len);
                self.inline_transactions.truncate(queued);
                self.notified.truncate(notified);
                self.control_trx.resources_mut().restore_storage(storage);
                trace.discard_receipts();
            }
        }
        trace.finalize(&result);

        match result {
            Err(e) if e.kind() == ExceptionKind::Timeout => Err(e),
            Err(e) => {
                debug!(
                    target: "wasm",
                    "notification of {}::{} to {} failed: {}",
                    self.trx.contract, self.trx.action, self.receiver, e
                );
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    /// Runs the action once on the current receiver.
    fn execute_one(
        &mut self, trace: &mut InlineTransactionTrace,
    ) -> vm::Result<()> {
        let start = self.control_trx.now();
        self.control_trx.inc_recipients_size();
        self.reset_console();
        self.pending_receipts.clear();
        self.exited = false;

        let mut result = self.dispatch();
        if self.control_trx.resources_mut().release_pause() {
            warn!(
                target: "wasm",
                "{} returned with the billing timer paused", self.receiver
            );
            if result.is_ok() {
                result = Err(wasm_exception!(
                    Transaction,
                    "billing timer left paused, receiver = {}, action = {}",
                    self.receiver,
                    self.trx.action
                ));
            }
        }
        if let Err(e) = &result {
            if e.kind() == ExceptionKind::Timeout {
                warn!(target: "wasm", "{} timed out: {}", self.receiver, e);
            }
        }

        let elapsed: Duration = self.control_trx.now().saturating_sub(start);
        trace.record_execution(
            elapsed,
            mem::take(&mut self.pending_console_output),
            mem::take(&mut self.pending_receipts),
        );
        result
    }

    fn dispatch(&mut self) -> vm::Result<()> {
        self.checktime()?;
        let machine = self.machine;
        let (receiver, action) = (self.receiver, self.trx.action);

        if let Some(handler) = machine.native_contracts().get(receiver, action)
        {
            trace!(target: "wasm", "native {}::{}", receiver, action);
            handler(self)?;
            return self.checktime();
        }

        let code = match self.receiver_code()? {
            Some(code) => code,
            None => {
                trace!(target: "wasm", "{} has no code, skipped", receiver);
                return Ok(());
            }
        };
        machine
            .wasm_interface()
            .execute(&code, self)
            .capture_and_rethrow(|| {
                format!(
                    "wasm execution failed, receiver = {}, action = {}",
                    receiver, action
                )
            })?;
        self.checktime()
    }

    fn receiver_code(&self) -> vm::Result<Option<Arc<Bytes>>> {
        if self.receiver == self.trx.contract {
            if let Some(code) = &self.code {
                return Ok(Some(code.clone()));
            }
        }
        let account = match self.state.get_account(self.receiver)? {
            Some(account) => account,
            None => return Ok(None),
        };
        Ok(self
            .state
            .get_code(&account)?
            .filter(|code| !code.is_empty())
            .map(Arc::new))
    }

    fn contract_account(
        &self, contract: Name, op: &str,
    ) -> vm::Result<Account> {
        match self.state.get_account(contract)? {
            Some(account) => Ok(account),
            None => wasm_throw!(
                AccountOperation,
                "{}, contract account does not exist, contract = {}",
                op,
                contract
            ),
        }
    }

    fn authorization(&self) -> AuthorizationChecker<'_> {
        AuthorizationChecker::new(self.control_trx.signers(), self.receiver)
    }
}

impl<'a> Context for WasmContext<'a> {
    fn receiver(&self) -> Name { self.receiver }

    fn contract(&self) -> Name { self.trx.contract }

    fn action(&self) -> Name { self.trx.action }

    fn get_action_data(&self) -> &[u8] { &self.trx.data }

    fn execute_inline(&mut self, trx: InlineTransaction) -> vm::Result<()> {
        self.checktime()?;
        wasm_assert!(
            !trx.contract.is_empty(),
            Pack,
            "inline transaction without contract, action = {}",
            trx.action
        );
        let size = trx.packed_size();
        let max_size = self.machine.spec().max_inline_transaction_size;
        wasm_assert!(
            size <= max_size,
            InlineTransactionTooBig,
            "inline transaction too big, size = {}, max = {}",
            size,
            max_size
        );
        debug!(
            target: "wasm",
            "{} schedules {}::{} ({} bytes)",
            self.receiver, trx.contract, trx.action, size
        );
        self.inline_transactions.push((self.receiver, trx));
        Ok(())
    }

    fn has_recipient(&self, account: Name) -> bool {
        self.notified.contains(&account)
    }

    fn require_recipient(&mut self, recipient: Name) -> vm::Result<()> {
        if !self.has_recipient(recipient) {
            self.notified.push(recipient);
        }
        Ok(())
    }

    fn is_account(&self, account: Name) -> vm::Result<bool> {
        Ok(self.state.get_account(account)?.is_some())
    }

    fn require_auth(&self, account: Name) -> vm::Result<()> {
        self.authorization().require(account)
    }

    fn require_auth2(&self, account: Name, permission: Name) -> vm::Result<()> {
        self.require_auth(account)?;
        wasm_assert!(
            account == self.receiver
                || self
                    .trx
                    .authorization
                    .contains(&Permission::new(account, permission)),
            MissingAuth,
            "missing authority of {}@{}",
            account,
            permission
        );
        Ok(())
    }

    fn has_authorization(&self, account: Name) -> bool {
        self.trx.authorization.iter().any(|p| p.account == account)
    }

    fn has_permission_from_inline_transaction(&self, p: &Permission) -> bool {
        self.authorization().satisfied(p)
    }

    fn block_time(&self) -> u64 { self.control_trx.block_time() }

    fn get_code(&self, account: Name) -> vm::Result<Bytes> {
        let acct = self.contract_account(account, "get_code")?;
        match self.state.get_code(&acct)? {
            Some(code) if !code.is_empty() => Ok(code),
            _ => wasm_throw!(
                AccountOperation,
                "cannot get code of account {}",
                account
            ),
        }
    }

    fn get_data(
        &mut self, contract: Name, key: &[u8],
    ) -> vm::Result<Option<Bytes>> {
        self.checktime()?;
        let account = self.contract_account(contract, "get_data")?;
        Ok(self.state.get_contract_data(account.regid, key)?)
    }

    fn set_data(
        &mut self, contract: Name, key: &[u8], value: &[u8],
    ) -> vm::Result<bool> {
        self.checktime()?;
        let account = self.contract_account(contract, "set_data")?;
        let old_size = self
            .state
            .get_contract_data(account.regid, key)?
            .map_or(0, |old| (key.len() + old.len()) as i64);
        if !self.state.set_contract_data(account.regid, key, value)? {
            return Ok(false);
        }
        let new_size = (key.len() + value.len()) as i64;
        self.update_storage_usage(contract, new_size - old_size)?;
        Ok(true)
    }

    fn erase_data(&mut self, contract: Name, key: &[u8]) -> vm::Result<bool> {
        self.checktime()?;
        let account = self.contract_account(contract, "erase_data")?;
        let old = match self.state.get_contract_data(account.regid, key)? {
            Some(old) => old,
            None => return Ok(false),
        };
        if !self.state.erase_contract_data(account.regid, key)? {
            return Ok(false);
        }
        self.update_storage_usage(contract, -((key.len() + old.len()) as i64))?;
        Ok(true)
    }

    fn emit_receipt(&mut self, receipt: Receipt) -> vm::Result<()> {
        self.receipts.push(receipt.clone());
        self.pending_receipts.push(receipt);
        Ok(())
    }

    fn contracts_console(&self) -> bool { self.control_trx.contracts_console() }

    fn console_append(&mut self, val: &str) {
        if self.contracts_console() {
            self.pending_console_output.push_str(val);
        }
    }

    fn reset_console(&mut self) { self.pending_console_output.clear(); }

    fn get_console_stream(&self) -> &str { &self.pending_console_output }

    fn get_wasm_allocator(&mut self) -> &mut WasmAllocator {
        &mut self.wasm_alloc
    }

    fn is_memory_in_wasm_allocator(&self, offset: usize) -> bool {
        self.wasm_alloc.is_in_range(offset)
    }

    fn get_max_transaction_duration(&self) -> Duration {
        self.control_trx.get_max_transaction_duration()
    }

    fn update_storage_usage(
        &mut self, account: Name, size_in_bytes: i64,
    ) -> vm::Result<()> {
        if size_in_bytes == 0 {
            return Ok(());
        }
        self.control_trx.update_storage_usage(account, size_in_bytes);
        self.emit_receipt(Receipt::storage_usage(account, size_in_bytes))
    }

    fn pause_billing_timer(&mut self) -> vm::Result<()> {
        self.control_trx.pause_billing_timer().map_err(|e| {
            warn!(target: "wasm", "{} pause billing: {}", self.receiver, e);
            e
        })
    }

    fn resume_billing_timer(&mut self) -> vm::Result<()> {
        self.control_trx.resume_billing_timer().map_err(|e| {
            warn!(target: "wasm", "{} resume billing: {}", self.receiver, e);
            e
        })
    }

    fn checktime(&self) -> vm::Result<()> { self.control_trx.checktime() }

    fn exit(&mut self) { self.exited = true; }

    fn exited(&self) -> bool { self.exited }
}
