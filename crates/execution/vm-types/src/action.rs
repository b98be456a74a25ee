// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{Bytes, Name};
use serde_derive::{Deserialize, Serialize};

/// An (account, permission level) pair attached to an action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub struct Permission {
    pub account: Name,
    pub perm: Name,
}

impl Permission {
    pub fn new(account: Name, perm: Name) -> Self { Permission { account, perm } }
}

/// One invocation of a contract entry point. Top-level actions come from the
/// controlling transaction; inline ones are scheduled by executing contract
/// code and run after the scheduling action returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineTransaction {
    pub contract: Name,
    pub action: Name,
    pub authorization: Vec<Permission>,
    pub data: Bytes,
}

impl InlineTransaction {
    pub fn new(
        contract: Name, action: Name, authorization: Vec<Permission>,
        data: Bytes,
    ) -> Self {
        InlineTransaction {
            contract,
            action,
            authorization,
            data,
        }
    }

    /// Size of the action in its packed wire form: two names, a
    /// length-prefixed permission list and length-prefixed payload.
    pub fn packed_size(&self) -> usize {
        16 + varuint_size(self.authorization.len())
            + self.authorization.len() * 16
            + varuint_size(self.data.len())
            + self.data.len()
    }
}

fn varuint_size(mut value: usize) -> usize {
    let mut size = 1;
    while value >= 0x80 {
        value >>= 7;
        size += 1;
    }
    size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_size() {
        let trx = InlineTransaction::default();
        assert_eq!(trx.packed_size(), 18);

        let alice = Name::new(1);
        let trx = InlineTransaction::new(
            alice,
            alice,
            vec![Permission::new(alice, alice)],
            vec![0u8; 200],
        );
        assert_eq!(trx.packed_size(), 16 + 1 + 16 + 2 + 200);
    }
}
