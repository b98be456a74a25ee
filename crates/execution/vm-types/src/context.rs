// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Interface for contract externalities.
//!
//! The interpreter drives guest code and calls back into this surface for
//! every host function. Implementations must report all failures as typed
//! [`WasmException`](crate::WasmException)s.

use crate::{
    action::{InlineTransaction, Permission},
    error::Result,
    memory::WasmAllocator,
    receipt::Receipt,
    Bytes, Name,
};
use std::time::Duration;

pub trait Context {
    /// The account whose code is currently executing.
    fn receiver(&self) -> Name;

    /// The contract the running action was sent to.
    fn contract(&self) -> Name;

    fn action(&self) -> Name;

    fn get_action_data(&self) -> &[u8];

    /// Schedules `trx` to run after the current action returns.
    fn execute_inline(&mut self, trx: InlineTransaction) -> Result<()>;

    fn has_recipient(&self, account: Name) -> bool;

    /// Registers `recipient` to be notified of the current action.
    fn require_recipient(&mut self, recipient: Name) -> Result<()>;

    fn is_account(&self, account: Name) -> Result<bool>;

    fn require_auth(&self, account: Name) -> Result<()>;

    fn require_auth2(&self, account: Name, permission: Name) -> Result<()>;

    /// Whether `account` appears in the authorization list of the running
    /// action.
    fn has_authorization(&self, account: Name) -> bool;

    fn has_permission_from_inline_transaction(&self, p: &Permission) -> bool;

    fn block_time(&self) -> u64;

    fn get_code(&self, account: Name) -> Result<Bytes>;

    fn get_data(&mut self, contract: Name, key: &[u8]) -> Result<Option<Bytes>>;

    fn set_data(
        &mut self, contract: Name, key: &[u8], value: &[u8],
    ) -> Result<bool>;

    fn erase_data(&mut self, contract: Name, key: &[u8]) -> Result<bool>;

    fn emit_receipt(&mut self, receipt: Receipt) -> Result<()>;

    fn contracts_console(&self) -> bool;

    fn console_append(&mut self, val: &str);

    fn reset_console(&mut self);

    fn get_console_stream(&self) -> &str;

    fn get_wasm_allocator(&mut self) -> &mut WasmAllocator;

    fn is_memory_in_wasm_allocator(&self, offset: usize) -> bool;

    fn get_max_transaction_duration(&self) -> Duration;

    fn update_storage_usage(
        &mut self, account: Name, size_in_bytes: i64,
    ) -> Result<()>;

    fn pause_billing_timer(&mut self) -> Result<()>;

    fn resume_billing_timer(&mut self) -> Result<()>;

    /// Fails with a timeout once the billed time passes the ceiling.
    fn checktime(&self) -> Result<()>;

    /// Requests the interpreter to stop the current action without error.
    fn exit(&mut self);

    fn exited(&self) -> bool;
}
