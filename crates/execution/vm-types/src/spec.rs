// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Execution limits and other parameterisations of the contract runtime.

use crate::memory::DEFAULT_MAX_WASM_MEMORY;
use serde_derive::Deserialize;
use std::{fs::read_to_string, time::Duration};

/// Definition of the limits enforced while executing one transaction.
///
/// `Default` gives the consensus values. A node may override them from a TOML
/// section; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Spec {
    /// Max nesting level of inline actions. The top-level action runs at
    /// depth 0.
    pub max_inline_transaction_depth: u32,
    /// Max packed size of one inline action scheduled by a contract.
    pub max_inline_transaction_size: usize,
    /// Ceiling of the billed execution time of one transaction.
    pub max_transaction_duration_ms: u64,
    /// Capture contract console output. Only honoured while validating.
    pub contracts_console: bool,
    /// Max size of the linear memory of one contract instance.
    pub max_wasm_memory: usize,
}

impl Default for Spec {
    fn default() -> Self {
        Spec {
            max_inline_transaction_depth: 4,
            max_inline_transaction_size: 4 * 1024,
            max_transaction_duration_ms: 150,
            contracts_console: false,
            max_wasm_memory: DEFAULT_MAX_WASM_MEMORY,
        }
    }
}

impl Spec {
    pub fn max_transaction_duration(&self) -> Duration {
        Duration::from_millis(self.max_transaction_duration_ms)
    }

    pub fn from_toml_str(
        content: &str, section: Option<&str>,
    ) -> Result<Self, String> {
        let toml_val = content
            .parse::<toml::Value>()
            .map_err(|e| format!("failed to parse toml: {:?}", e))?;

        let val = match section {
            Some(section) => match toml_val.get(section) {
                Some(val) => val.clone(),
                None => return Err(format!("section [{}] not found", section)),
            },
            None => toml_val,
        };

        val.try_into()
            .map_err(|e| format!("invalid execution spec: {:?}", e))
    }

    pub fn from_toml_file(
        toml_file: &str, section: Option<&str>,
    ) -> Result<Self, String> {
        let content = read_to_string(toml_file)
            .map_err(|e| format!("failed to read toml file: {:?}", e))?;
        Self::from_toml_str(&content, section)
    }
}

#[cfg(test)]
mod tests {
    use super::Spec;
    use std::time::Duration;

    #[test]
    fn defaults() {
        let spec = Spec::default();
        assert_eq!(spec.max_inline_transaction_depth, 4);
        assert_eq!(spec.max_transaction_duration(), Duration::from_millis(150));
        assert!(!spec.contracts_console);
    }

    #[test]
    fn load_section() {
        let content = r#"
            [other]
            max_inline_transaction_depth = 1

            [wasm]
            max_inline_transaction_depth = 8
            contracts_console = true
        "#;
        let spec = Spec::from_toml_str(content, Some("wasm")).unwrap();
        assert_eq!(spec.max_inline_transaction_depth, 8);
        assert!(spec.contracts_console);
        assert_eq!(spec.max_inline_transaction_size, 4 * 1024);

        assert!(Spec::from_toml_str(content, Some("missing")).is_err());
        assert!(Spec::from_toml_str("max_wasm_memory = \"big\"", None).is_err());
    }
}
