// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Execution errors module.
//!
//! Every failure raised by a host call, by the storage collaborator or by the
//! interpreter is normalized into a [`WasmException`] before it leaves the
//! execution context. The set of kinds is closed and each kind owns a stable
//! numeric code from the reserved `5_000_000` range.

use std::fmt;
use strum_macros::{EnumIter, IntoStaticStr};
use thiserror::Error;

macro_rules! declare_exceptions {
    ($($(#[$doc:meta])* $variant:ident = $code:literal, $what:literal;)*) => {
        /// The closed set of failure kinds.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr,
        )]
        pub enum ExceptionKind {
            $($(#[$doc])* $variant,)*
        }

        impl ExceptionKind {
            /// Stable numeric code of this kind.
            pub fn code(&self) -> u32 {
                match self {
                    $(ExceptionKind::$variant => $code,)*
                }
            }

            /// Fixed human-readable category.
            pub fn what(&self) -> &'static str {
                match self {
                    $(ExceptionKind::$variant => $what,)*
                }
            }

            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(ExceptionKind::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

declare_exceptions! {
    Wasm = 5000000, "wasm exception";
    AbiParse = 5000001, "abi parse exception";
    AbiSerializationDeadline = 5000002, "abi serialization deadline exception";
    UnsupportedAbiVersion = 5000003, "unsupport abi version exception";
    InvalidTypeInsideAbi = 5000004, "invalid type inside abi";
    DuplicateAbiDef = 5000005, "duplicate abi def exception";
    AbiCircularDef = 5000006, "abi circular def exception";
    /// Transaction level violation, e.g. the inline depth limit.
    Transaction = 5000007, "transaction exception";
    Unpack = 5000008, "unpack exception";
    /// A referenced account or its code does not exist.
    AccountOperation = 5000009, "account operation exception";
    WasmAssert = 5000010, "wasm assert exception";
    SymbolType = 5000011, "symbol type exception";
    ArraySizeExceeds = 5000012, "array size exceeds exception";
    Pack = 5000013, "pack exception";
    InlineTransactionTooBig = 5000014, "inline transaction too big";
    ApiDataSizeTooBig = 5000015, "wasm api data too big";
    OverlappingMemory = 5000016, "memcpy can only accept non-aliasing pointers";
    UnsatisfiedAuthorization = 5000017, "unsatisfied authorization";
    AbortCalled = 5000018, "abort called";
    WasmAssertCode = 5000019, "wasm assert code";
    /// Generic kind for foreign failures crossing the host boundary.
    WasmExecution = 5000020, "wasm execution error";
    FileRead = 5000021, "file read exception";
    MissingAuth = 5000022, "missing auth exception";
    FuelFee = 5000023, "fuel fee exception";
    Timeout = 5000024, "timeout exception";
    AssetType = 5000025, "asset type exception";
    WasmMemory = 5000026, "wasm memory exception";
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.what())
    }
}

/// A typed execution failure: a kind (code and category) plus a mutable
/// detail message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {}", .kind.what(), .msg)]
pub struct WasmException {
    kind: ExceptionKind,
    msg: String,
}

impl WasmException {
    pub fn new(kind: ExceptionKind, msg: impl Into<String>) -> Self {
        WasmException {
            kind,
            msg: msg.into(),
        }
    }

    /// Wraps a foreign failure into `kind`.
    pub fn capture<E: fmt::Display>(kind: ExceptionKind, err: E) -> Self {
        WasmException::new(kind, format!("{:#}", err))
    }

    pub fn kind(&self) -> ExceptionKind { self.kind }

    pub fn code(&self) -> u32 { self.kind.code() }

    pub fn what(&self) -> &'static str { self.kind.what() }

    pub fn detail(&self) -> &str { &self.msg }

    /// Appends `context` to the detail message. The code never changes, so
    /// the root cause survives any number of rethrow points.
    pub fn rethrow(mut self, context: impl fmt::Display) -> Self {
        self.msg = format!("{} , {}", self.msg, context);
        self
    }
}

impl From<anyhow::Error> for WasmException {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<WasmException>() {
            Ok(exception) => exception,
            Err(foreign) => {
                WasmException::capture(ExceptionKind::WasmExecution, foreign)
            }
        }
    }
}

pub type Result<T> = ::std::result::Result<T, WasmException>;

/// Rethrow helpers for any result whose error can be viewed as an
/// `anyhow::Error`. Typed errors keep their code and get the context appended;
/// anything else is wrapped into a typed kind.
pub trait ResultExt<T> {
    fn rethrow_with<F, S>(self, kind: ExceptionKind, context: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: fmt::Display;

    fn capture_and_rethrow<F, S>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: fmt::Display;
}

impl<T, E> ResultExt<T> for ::std::result::Result<T, E>
where E: Into<anyhow::Error>
{
    fn rethrow_with<F, S>(self, kind: ExceptionKind, context: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: fmt::Display,
    {
        self.map_err(|err| {
            let err: anyhow::Error = err.into();
            match err.downcast::<WasmException>() {
                Ok(exception) => exception.rethrow(context()),
                Err(foreign) => WasmException::new(
                    kind,
                    format!("{} , {:#}", context(), foreign),
                ),
            }
        })
    }

    fn capture_and_rethrow<F, S>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: fmt::Display,
    {
        self.map_err(|err| {
            let err: anyhow::Error = err.into();
            match err.downcast::<WasmException>() {
                Ok(exception) => exception,
                Err(foreign) => WasmException::new(
                    ExceptionKind::WasmExecution,
                    format!("{} , {:#}", context(), foreign),
                ),
            }
        })
    }
}

/// Builds a [`WasmException`] whose detail is prefixed with the raising
/// location.
#[macro_export]
macro_rules! wasm_exception {
    ($kind:ident, $($arg:tt)+) => {
        $crate::WasmException::new(
            $crate::ExceptionKind::$kind,
            format!(
                "{}:{}:[{}], {}",
                file!(),
                line!(),
                module_path!(),
                format_args!($($arg)+)
            ),
        )
    };
}

#[macro_export]
macro_rules! wasm_assert {
    ($expr:expr, $kind:ident, $($arg:tt)+) => {
        if !($expr) {
            return Err($crate::wasm_exception!($kind, $($arg)+).into());
        }
    };
}

#[macro_export]
macro_rules! wasm_throw {
    ($kind:ident, $($arg:tt)+) => {
        return Err($crate::wasm_exception!($kind, $($arg)+).into())
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    fn guarded(value: u32) -> Result<u32> {
        wasm_assert!(value < 10, ArraySizeExceeds, "value {} too large", value);
        Ok(value)
    }

    fn always_abort() -> Result<()> {
        wasm_throw!(AbortCalled, "abort() called by contract");
    }

    #[test]
    fn codes_are_unique_and_contiguous() {
        let codes: HashSet<u32> = ExceptionKind::iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), ExceptionKind::iter().count());
        assert_eq!(codes.len(), 27);
        for code in 5_000_000..5_000_027 {
            assert!(codes.contains(&code), "missing code {}", code);
        }
        for kind in ExceptionKind::iter() {
            assert_eq!(ExceptionKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ExceptionKind::from_code(4_999_999), None);
    }

    #[test]
    fn assert_macro_records_location() {
        assert_eq!(guarded(3), Ok(3));
        let err = guarded(12).unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::ArraySizeExceeds);
        assert_eq!(err.code(), 5_000_012);
        assert!(err.detail().contains("error.rs"));
        assert!(err.detail().ends_with("value 12 too large"));

        let err = always_abort().unwrap_err();
        assert_eq!(err.what(), "abort called");
    }

    #[test]
    fn rethrow_keeps_code() {
        let err = WasmException::new(ExceptionKind::MissingAuth, "missing bob")
            .rethrow("while executing inline action 1")
            .rethrow("while executing inline action 0");
        assert_eq!(err.kind(), ExceptionKind::MissingAuth);
        assert_eq!(
            err.detail(),
            "missing bob , while executing inline action 1 , while executing \
             inline action 0"
        );
        assert_eq!(
            err.to_string(),
            format!("missing auth exception: {}", err.detail())
        );
    }

    #[test]
    fn foreign_errors_are_normalized() {
        let typed: ::std::result::Result<(), anyhow::Error> =
            Err(WasmException::new(ExceptionKind::Timeout, "deadline").into());
        let err = typed.capture_and_rethrow(|| "vm").unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::Timeout);
        assert_eq!(err.detail(), "deadline");

        let foreign: ::std::result::Result<(), anyhow::Error> =
            Err(anyhow::anyhow!("trap: unreachable"));
        let err = foreign.capture_and_rethrow(|| "vm").unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::WasmExecution);
        assert_eq!(err.detail(), "vm , trap: unreachable");

        let io: ::std::result::Result<(), std::io::Error> = Err(
            std::io::Error::new(std::io::ErrorKind::NotFound, "no abi file"),
        );
        let err = io
            .rethrow_with(ExceptionKind::FileRead, || "load abi")
            .unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::FileRead);

        let err: WasmException = anyhow::anyhow!("opaque").into();
        assert_eq!(err.kind(), ExceptionKind::WasmExecution);
    }
}
