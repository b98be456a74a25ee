// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use std::collections::BTreeSet;
use wasm_vm_types::{
    self as vm, wasm_assert, InlineTransaction, Name, Permission,
};

/// Decides which authorities are available to the code running on behalf of
/// `receiver`: every verified signer of the controlling transaction, plus the
/// receiver itself.
pub struct AuthorizationChecker<'a> {
    signers: &'a BTreeSet<Name>,
    receiver: Name,
}

impl<'a> AuthorizationChecker<'a> {
    pub fn new(signers: &'a BTreeSet<Name>, receiver: Name) -> Self {
        AuthorizationChecker { signers, receiver }
    }

    pub fn account_satisfied(&self, account: Name) -> bool {
        account == self.receiver || self.signers.contains(&account)
    }

    pub fn satisfied(&self, permission: &Permission) -> bool {
        self.account_satisfied(permission.account)
    }

    pub fn require(&self, account: Name) -> vm::Result<()> {
        wasm_assert!(
            self.account_satisfied(account),
            MissingAuth,
            "missing authority of {}",
            account
        );
        Ok(())
    }

    /// Every permission declared by `trx` must be grantable by the issuer.
    pub fn check_transaction(&self, trx: &InlineTransaction) -> vm::Result<()> {
        for permission in &trx.authorization {
            wasm_assert!(
                self.satisfied(permission),
                UnsatisfiedAuthorization,
                "{}@{} is not granted to {}, action {}::{}",
                permission.account,
                permission.perm,
                self.receiver,
                trx.contract,
                trx.action
            );
        }
        Ok(())
    }
}
