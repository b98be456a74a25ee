// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! RPC error codes used for contract execution failures.
//!
//! JsonRPC reserves -32768 to -32000 for pre-defined errors, -32000 to -32099
//! being "Server Error". The numbers follow the Ethereum client conventions
//! so that existing clients classify them correctly.

use wasm_vm_types::ExceptionKind;

/// Contract execution failed. The failure is attributable to the transaction
/// or to the contract code.
pub const CALL_EXECUTION_ERROR: i64 = -32015;
/// An internal failure of the node while executing, e.g. a storage error or
/// an interpreter fault.
pub const EXCEPTION_ERROR: i64 = -32016;
/// The request exceeded a size or time limit.
pub const REQUEST_REJECTED_LIMIT_DATA: i64 = -32041;

pub fn server_error_code(kind: ExceptionKind) -> i64 {
    match kind {
        ExceptionKind::WasmExecution => EXCEPTION_ERROR,
        ExceptionKind::Timeout
        | ExceptionKind::InlineTransactionTooBig
        | ExceptionKind::ApiDataSizeTooBig => REQUEST_REJECTED_LIMIT_DATA,
        _ => CALL_EXECUTION_ERROR,
    }
}
