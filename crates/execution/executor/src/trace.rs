// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Execution traces.
//!
//! Every receiver execution produces one [`InlineTransactionTrace`] node.
//! Notification nodes and inline-action nodes are appended as children of the
//! node that caused them, in the order they ran.

use serde_derive::Serialize;
use std::time::Duration;
use wasm_vm_types::{
    self as vm, InlineTransaction, Name, Receipt, WasmException, H256,
};

/// The failure recorded on a trace node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceError {
    pub code: u32,
    pub what: String,
    pub detail: String,
}

impl From<&WasmException> for TraceError {
    fn from(e: &WasmException) -> Self {
        TraceError {
            code: e.code(),
            what: e.what().to_string(),
            detail: e.detail().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineTransactionTrace {
    pub trx_id: H256,
    pub receiver: Name,
    pub trx: InlineTransaction,
    pub elapsed: Duration,
    pub console: String,
    pub receipts: Vec<Receipt>,
    pub inline_traces: Vec<InlineTransactionTrace>,
    pub except: Option<TraceError>,
    #[serde(skip)]
    finalized: bool,
}

impl InlineTransactionTrace {
    pub fn new(trx_id: H256, trx: &InlineTransaction, receiver: Name) -> Self {
        InlineTransactionTrace {
            trx_id,
            receiver,
            trx: trx.clone(),
            elapsed: Duration::ZERO,
            console: String::new(),
            receipts: Vec::new(),
            inline_traces: Vec::new(),
            except: None,
            finalized: false,
        }
    }

    pub fn is_finalized(&self) -> bool { self.finalized }

    pub fn is_success(&self) -> bool { self.except.is_none() }

    /// Stores the output of the receiver's own execution.
    pub(crate) fn record_execution(
        &mut self, elapsed: Duration, console: String, receipts: Vec<Receipt>,
    ) {
        if self.finalized {
            warn!(
                target: "wasm",
                "record on finalized trace of {}", self.receiver
            );
            return;
        }
        self.elapsed = elapsed;
        self.console = console;
        self.receipts = receipts;
    }

    /// Drops the receipts of an execution whose effects were rolled back.
    pub(crate) fn discard_receipts(&mut self) {
        if self.finalized {
            warn!(
                target: "wasm",
                "discard on finalized trace of {}", self.receiver
            );
            return;
        }
        self.receipts.clear();
    }

    pub(crate) fn push_inline_trace(&mut self, trace: InlineTransactionTrace) {
        if self.finalized {
            warn!(
                target: "wasm",
                "append on finalized trace of {}", self.receiver
            );
            return;
        }
        self.inline_traces.push(trace);
    }

    /// Freezes the node. Only the first call has an effect.
    pub(crate) fn finalize(&mut self, result: &vm::Result<()>) -> bool {
        if self.finalized {
            return false;
        }
        self.except = result.as_ref().err().map(TraceError::from);
        self.finalized = true;
        true
    }

    /// Pre-order walk: a node, then its children in execution order.
    pub fn flatten(&self) -> Vec<&InlineTransactionTrace> {
        let mut nodes = vec![self];
        for child in &self.inline_traces {
            nodes.extend(child.flatten());
        }
        nodes
    }

    /// Compares the parts of two traces every honest node must agree on.
    /// Timing, console output and failure details are local observations.
    pub fn consensus_eq(&self, other: &Self) -> bool {
        self.trx_id == other.trx_id
            && self.receiver == other.receiver
            && self.trx == other.trx
            && self.receipts == other.receipts
            && self.except.as_ref().map(|e| e.code)
                == other.except.as_ref().map(|e| e.code)
            && self.inline_traces.len() == other.inline_traces.len()
            && self
                .inline_traces
                .iter()
                .zip(other.inline_traces.iter())
                .all(|(a, b)| a.consensus_eq(b))
    }
}

/// Traces of all top-level actions of one transaction.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TransactionTrace {
    pub trx_id: H256,
    pub elapsed: Duration,
    pub traces: Vec<InlineTransactionTrace>,
}

impl TransactionTrace {
    pub fn flatten(&self) -> Vec<&InlineTransactionTrace> {
        self.traces.iter().flat_map(|t| t.flatten()).collect()
    }

    pub fn consensus_eq(&self, other: &Self) -> bool {
        self.trx_id == other.trx_id
            && self.traces.len() == other.traces.len()
            && self
                .traces
                .iter()
                .zip(other.traces.iter())
                .all(|(a, b)| a.consensus_eq(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_vm_types::ExceptionKind;

    fn name(s: &str) -> Name { s.parse().unwrap() }

    fn node(receiver: &str) -> InlineTransactionTrace {
        let trx = InlineTransaction::new(
            name("token"),
            name("transfer"),
            vec![],
            vec![1, 2, 3],
        );
        InlineTransactionTrace::new(H256::zero(), &trx, name(receiver))
    }

    #[test]
    fn finalize_once() {
        let mut trace = node("token");
        trace.record_execution(
            Duration::from_millis(3),
            "hello".into(),
            vec![Receipt::storage_usage(name("token"), 10)],
        );
        let err = WasmException::new(ExceptionKind::AbortCalled, "abort");
        assert!(trace.finalize(&Err(err)));
        assert!(!trace.finalize(&Ok(())));
        assert_eq!(trace.except.as_ref().unwrap().code, 5_000_018);

        trace.record_execution(Duration::ZERO, String::new(), vec![]);
        trace.push_inline_trace(node("bob"));
        assert_eq!(trace.console, "hello");
        assert_eq!(trace.receipts.len(), 1);
        assert!(trace.inline_traces.is_empty());
    }

    #[test]
    fn flatten_and_consensus() {
        let mut child = node("alice");
        child.push_inline_trace(node("carol"));
        let mut root = node("token");
        root.push_inline_trace(child);
        root.push_inline_trace(node("bob"));

        let order: Vec<String> =
            root.flatten().iter().map(|t| t.receiver.to_string()).collect();
        assert_eq!(order, vec!["token", "alice", "carol", "bob"]);

        let mut other = root.clone();
        other.elapsed = Duration::from_secs(1);
        other.console = "local".into();
        assert!(root.consensus_eq(&other));

        other.inline_traces[1].receipts.push(Receipt::storage_usage(
            name("bob"),
            1,
        ));
        assert!(!root.consensus_eq(&other));

        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["receiver"], "token");
        assert!(json.get("finalized").is_none());
    }
}
