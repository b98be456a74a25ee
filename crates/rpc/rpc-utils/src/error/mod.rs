// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

pub mod error_codes;
pub mod jsonrpc_error_helpers;

pub use jsonrpc_error_helpers::{
    build_rpc_server_error, execution_outcome_to_rpc, wasm_exception_data,
    wasm_exception_to_rpc_error,
};
