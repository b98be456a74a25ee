// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{Bytes, Name};
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptCode {
    /// Asset movement performed by a contract.
    Transfer,
    /// Signed storage byte delta charged to an account. The payload is the
    /// little-endian `i64` delta.
    StorageUsage,
    /// Free-form event data emitted by a contract.
    ContractEvent,
}

/// An effect caused by executing an action. Receipts are append-only and are
/// never modified once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub from: Name,
    pub to: Name,
    pub code: ReceiptCode,
    pub data: Bytes,
}

impl Receipt {
    pub fn new(from: Name, to: Name, code: ReceiptCode, data: Bytes) -> Self {
        Receipt {
            from,
            to,
            code,
            data,
        }
    }

    pub fn storage_usage(account: Name, delta: i64) -> Self {
        Receipt::new(
            account,
            account,
            ReceiptCode::StorageUsage,
            delta.to_le_bytes().to_vec(),
        )
    }
}
