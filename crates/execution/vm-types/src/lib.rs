// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Types shared by the contract runtime, the executor and the layers that
//! consume execution results.

pub mod action;
pub mod context;
pub mod error;
pub mod memory;
pub mod name;
pub mod receipt;
pub mod spec;

pub use self::{
    action::{InlineTransaction, Permission},
    context::Context,
    error::{ExceptionKind, Result, ResultExt, WasmException},
    memory::WasmAllocator,
    name::{Name, ParseNameError},
    receipt::{Receipt, ReceiptCode},
    spec::Spec,
};
pub use ethereum_types::H256;

pub type Bytes = Vec<u8>;
