// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use super::{Account, DbResult, Error, RegId, StateCache};
use std::collections::{hash_map::Entry, BTreeMap, HashMap};
use wasm_vm_types::{Bytes, Name};

type DataKey = (RegId, Bytes);

/// Old values of the entries first written after the checkpoint was taken.
/// An entry absent from the layer is unchanged since then.
#[derive(Default)]
struct CheckpointLayer {
    entries: HashMap<DataKey, Option<Bytes>>,
}

/// In-memory storage with checkpoint support.
#[derive(Default)]
pub struct MemoryState {
    accounts: HashMap<Name, Account>,
    codes: HashMap<RegId, Bytes>,
    data: BTreeMap<DataKey, Bytes>,
    checkpoints: Vec<CheckpointLayer>,
    unavailable: bool,
}

impl MemoryState {
    pub fn new() -> Self { Self::default() }

    /// Registers `name` with a fresh registration id, deploying `code` if
    /// given.
    pub fn register_account(
        &mut self, name: Name, code: Option<&[u8]>,
    ) -> Account {
        let regid = self.accounts.len() as RegId + 1;
        let account = Account { name, regid };
        self.accounts.insert(name, account.clone());
        if let Some(code) = code {
            self.codes.insert(regid, code.to_vec());
        }
        account
    }

    /// Makes every subsequent query fail, emulating a broken backend.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    pub fn data_len(&self) -> usize { self.data.len() }

    pub fn checkpoint_depth(&self) -> usize { self.checkpoints.len() }

    fn ensure_available(&self) -> DbResult<()> {
        if self.unavailable {
            return Err(Error::Msg("storage backend unavailable".into()));
        }
        Ok(())
    }

    fn record_old_value(&mut self, key: &DataKey) {
        let old = self.data.get(key).cloned();
        if let Some(layer) = self.checkpoints.last_mut() {
            layer.entries.entry(key.clone()).or_insert(old);
        }
    }
}

impl StateCache for MemoryState {
    fn get_account(&self, name: Name) -> DbResult<Option<Account>> {
        self.ensure_available()?;
        Ok(self.accounts.get(&name).cloned())
    }

    fn get_code(&self, account: &Account) -> DbResult<Option<Bytes>> {
        self.ensure_available()?;
        Ok(self.codes.get(&account.regid).cloned())
    }

    fn get_contract_data(
        &self, regid: RegId, key: &[u8],
    ) -> DbResult<Option<Bytes>> {
        self.ensure_available()?;
        Ok(self.data.get(&(regid, key.to_vec())).cloned())
    }

    fn set_contract_data(
        &mut self, regid: RegId, key: &[u8], value: &[u8],
    ) -> DbResult<bool> {
        self.ensure_available()?;
        let key = (regid, key.to_vec());
        self.record_old_value(&key);
        self.data.insert(key, value.to_vec());
        Ok(true)
    }

    fn erase_contract_data(
        &mut self, regid: RegId, key: &[u8],
    ) -> DbResult<bool> {
        self.ensure_available()?;
        let key = (regid, key.to_vec());
        if !self.data.contains_key(&key) {
            return Ok(false);
        }
        self.record_old_value(&key);
        self.data.remove(&key);
        Ok(true)
    }

    fn checkpoint(&mut self) -> usize {
        self.checkpoints.push(CheckpointLayer::default());
        self.checkpoints.len() - 1
    }

    fn discard_checkpoint(&mut self) {
        let layer = match self.checkpoints.pop() {
            Some(layer) => layer,
            None => return,
        };
        if let Some(prev) = self.checkpoints.last_mut() {
            for (key, old) in layer.entries {
                if let Entry::Vacant(e) = prev.entries.entry(key) {
                    e.insert(old);
                }
            }
        }
    }

    fn revert_to_checkpoint(&mut self) {
        let layer = match self.checkpoints.pop() {
            Some(layer) => layer,
            None => return,
        };
        for (key, old) in layer.entries {
            match old {
                Some(value) => {
                    self.data.insert(key, value);
                }
                None => {
                    self.data.remove(&key);
                }
            }
        }
    }
}
