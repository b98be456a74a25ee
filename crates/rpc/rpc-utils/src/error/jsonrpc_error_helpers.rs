// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::error::error_codes as codes;
use jsonrpc_core::{Error, ErrorCode, Value};
use serde_json::json;
use wasm_executor::ExecutionOutcome;
use wasm_vm_types::WasmException;

pub fn build_rpc_server_error(code: i64, message: String) -> Error {
    Error {
        code: ErrorCode::ServerError(code),
        message,
        data: None,
    }
}

/// Structured payload of an execution failure: the stable exception code, its
/// kind name and the detail message.
pub fn wasm_exception_data(e: &WasmException) -> Value {
    let name: &'static str = e.kind().into();
    json!({
        "code": e.code(),
        "name": name,
        "detail": e.detail(),
    })
}

pub fn wasm_exception_to_rpc_error(e: &WasmException) -> Error {
    Error {
        code: ErrorCode::ServerError(codes::server_error_code(e.kind())),
        message: e.to_string(),
        data: Some(wasm_exception_data(e)),
    }
}

/// Renders a finished execution as JSON. A failed one becomes an RPC error
/// carrying the exception and the partial trace.
pub fn execution_outcome_to_rpc(
    outcome: ExecutionOutcome,
) -> Result<Value, Error> {
    match outcome {
        ExecutionOutcome::Finished(executed) => serde_json::to_value(&executed)
            .map_err(|e| {
                warn!("failed to serialize execution result: {}", e);
                build_rpc_server_error(
                    codes::EXCEPTION_ERROR,
                    format!("failed to serialize execution result: {}", e),
                )
            }),
        ExecutionOutcome::ExecutionError { error, trace } => {
            let mut rpc_error = wasm_exception_to_rpc_error(&error);
            if let (Some(Value::Object(data)), Ok(trace)) =
                (rpc_error.data.as_mut(), serde_json::to_value(&trace))
            {
                data.insert("trace".into(), trace);
            }
            Err(rpc_error)
        }
    }
}
