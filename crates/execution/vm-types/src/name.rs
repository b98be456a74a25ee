// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::error::{ExceptionKind, WasmException};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";
const MAX_NAME_LEN: usize = 13;

/// A 64-bit account, contract or action identifier. Names are written as up to
/// 12 characters from `.12345a-z`, plus an optional 13th character restricted
/// to `.12345a-j`.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseNameError {
    #[error("name is longer than {} characters: {0}", MAX_NAME_LEN)]
    TooLong(usize),
    #[error("invalid character {0:?} in name")]
    InvalidChar(char),
    #[error("invalid 13th character {0:?} in name")]
    InvalidLastChar(char),
}

impl From<ParseNameError> for WasmException {
    fn from(err: ParseNameError) -> Self {
        WasmException::capture(ExceptionKind::Unpack, err)
    }
}

fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl Name {
    pub const fn new(value: u64) -> Self { Name(value) }

    pub const fn value(&self) -> u64 { self.0 }

    pub fn is_empty(&self) -> bool { self.0 == 0 }
}

impl From<u64> for Name {
    fn from(value: u64) -> Self { Name(value) }
}

impl From<Name> for u64 {
    fn from(name: Name) -> u64 { name.0 }
}

impl FromStr for Name {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_NAME_LEN {
            return Err(ParseNameError::TooLong(bytes.len()));
        }

        let mut value = 0u64;
        for (i, &c) in bytes.iter().enumerate().take(MAX_NAME_LEN - 1) {
            let symbol =
                char_to_symbol(c).ok_or(ParseNameError::InvalidChar(c as char))?;
            value |= (symbol & 0x1f) << (64 - 5 * (i + 1));
        }

        if bytes.len() == MAX_NAME_LEN {
            let c = bytes[MAX_NAME_LEN - 1];
            let symbol =
                char_to_symbol(c).ok_or(ParseNameError::InvalidChar(c as char))?;
            if symbol > 0x0f {
                return Err(ParseNameError::InvalidLastChar(c as char));
            }
            value |= symbol;
        }

        Ok(Name(value))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut chars = [b'.'; MAX_NAME_LEN];
        let mut tmp = self.0;
        for i in 0..MAX_NAME_LEN {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            chars[MAX_NAME_LEN - 1 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }
        let len = chars
            .iter()
            .rposition(|c| *c != b'.')
            .map_or(0, |pos| pos + 1);
        // Every byte comes from `CHARMAP`, which is ASCII.
        f.write_str(std::str::from_utf8(&chars[..len]).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        let eosio: Name = "eosio".parse().unwrap();
        assert_eq!(eosio.value(), 6138663577826885632);
        let token: Name = "eosio.token".parse().unwrap();
        assert_eq!(token.value(), 6138663591592764928);
        assert_eq!(token.to_string(), "eosio.token");
        assert_eq!(Name::default().to_string(), "");
        assert!(Name::default().is_empty());
    }

    #[test]
    fn thirteenth_character() {
        let name: Name = "abcdefghijkla".parse().unwrap();
        assert_eq!(name.to_string(), "abcdefghijkla");
        assert_eq!(
            "abcdefghijklz".parse::<Name>(),
            Err(ParseNameError::InvalidLastChar('z'))
        );
        assert_eq!(
            "abcdefghijklmn".parse::<Name>(),
            Err(ParseNameError::TooLong(14))
        );
    }

    #[test]
    fn rejects_invalid_characters() {
        assert_eq!(
            "Alice".parse::<Name>(),
            Err(ParseNameError::InvalidChar('A'))
        );
        assert_eq!("bob9".parse::<Name>(), Err(ParseNameError::InvalidChar('9')));
        let err: WasmException = ParseNameError::InvalidChar('9').into();
        assert_eq!(err.kind(), ExceptionKind::Unpack);
    }

    #[test]
    fn serde_as_string() {
        let name: Name = "wasmio.bank".parse().unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"wasmio.bank\"");
        let back: Name = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
