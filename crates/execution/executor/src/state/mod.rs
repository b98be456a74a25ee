// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Storage collaborator seen by the execution context.
//!
//! Contract data lives in partitions keyed by the registration id of the
//! owning account. Writes are undoable through nested checkpoints.

#[cfg(any(test, feature = "testonly_code"))]
mod memory;

#[cfg(any(test, feature = "testonly_code"))]
pub use memory::MemoryState;

use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use wasm_vm_types::{Bytes, ExceptionKind, Name, WasmException};

/// Registration id of an on-chain account.
pub type RegId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: Name,
    pub regid: RegId,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("incomplete database: account={0}")]
    IncompleteDatabase(Name),

    #[error("{0}")]
    Msg(String),
}

pub type DbResult<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(e: String) -> Self { Error::Msg(e) }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self { Error::Msg(e.into()) }
}

impl From<Error> for WasmException {
    fn from(e: Error) -> Self {
        WasmException::capture(ExceptionKind::WasmExecution, e)
    }
}

pub trait StateCache {
    fn get_account(&self, name: Name) -> DbResult<Option<Account>>;

    fn get_code(&self, account: &Account) -> DbResult<Option<Bytes>>;

    fn get_contract_data(
        &self, regid: RegId, key: &[u8],
    ) -> DbResult<Option<Bytes>>;

    /// Returns whether the write was applied.
    fn set_contract_data(
        &mut self, regid: RegId, key: &[u8], value: &[u8],
    ) -> DbResult<bool>;

    /// Returns whether a value was present and removed.
    fn erase_contract_data(&mut self, regid: RegId, key: &[u8])
        -> DbResult<bool>;

    /// Creates a recoverable checkpoint and returns its index.
    fn checkpoint(&mut self) -> usize;

    /// Merges the latest checkpoint into the one below it.
    fn discard_checkpoint(&mut self);

    /// Undoes every write since the latest checkpoint and removes it.
    fn revert_to_checkpoint(&mut self);
}
