// Copyright 2019 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Linear memory backing a contract instance.
//!
//! The allocator is a bump arena: `alloc` only grows it, `free` drops the
//! whole region at once. Host calls use the bounds primitives before touching
//! guest memory so a bad pointer becomes a typed error rather than undefined
//! behaviour.

use crate::{error::Result, wasm_assert, wasm_throw};

/// The default ceiling of one arena, 33 MiB.
pub const DEFAULT_MAX_WASM_MEMORY: usize = 33 * 1024 * 1024;

#[derive(Debug)]
pub struct WasmAllocator {
    memory: Vec<u8>,
    max_size: usize,
    released: bool,
}

impl Default for WasmAllocator {
    fn default() -> Self { WasmAllocator::new(DEFAULT_MAX_WASM_MEMORY) }
}

impl WasmAllocator {
    pub fn new(max_size: usize) -> Self {
        WasmAllocator {
            memory: Vec::new(),
            max_size,
            released: false,
        }
    }

    /// Reserves `size` zeroed bytes and returns their offset.
    pub fn alloc(&mut self, size: usize) -> Result<usize> {
        wasm_assert!(
            !self.released,
            WasmMemory,
            "allocation of {} bytes from a released allocator",
            size
        );
        let offset = self.memory.len();
        let new_len = match offset.checked_add(size) {
            Some(len) if len <= self.max_size => len,
            _ => wasm_throw!(
                WasmMemory,
                "allocation of {} bytes exceeds the memory limit {}",
                size,
                self.max_size
            ),
        };
        self.memory.resize(new_len, 0);
        Ok(offset)
    }

    /// Releases the whole region. Calling it again is a no-op.
    pub fn free(&mut self) {
        if !self.released {
            self.memory = Vec::new();
            self.released = true;
        }
    }

    pub fn is_released(&self) -> bool { self.released }

    pub fn size(&self) -> usize { self.memory.len() }

    pub fn is_in_range(&self, offset: usize) -> bool {
        offset < self.memory.len()
    }

    pub fn validate_range(&self, offset: usize, len: usize) -> Result<()> {
        let in_bounds = offset
            .checked_add(len)
            .map_or(false, |end| end <= self.memory.len());
        wasm_assert!(
            in_bounds,
            WasmMemory,
            "access [{}, +{}) out of linear memory of {} bytes",
            offset,
            len,
            self.memory.len()
        );
        Ok(())
    }

    /// `memcpy` contract: source and destination must not alias.
    pub fn check_non_overlapping(
        &self, dst: usize, src: usize, len: usize,
    ) -> Result<()> {
        let distance = if dst > src { dst - src } else { src - dst };
        wasm_assert!(
            distance >= len,
            OverlappingMemory,
            "dst {} and src {} overlap for {} bytes",
            dst,
            src,
            len
        );
        Ok(())
    }

    pub fn read(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.validate_range(offset, len)?;
        Ok(&self.memory[offset..offset + len])
    }

    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        self.validate_range(offset, data.len())?;
        self.memory[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    pub fn memcpy(&mut self, dst: usize, src: usize, len: usize) -> Result<()> {
        self.validate_range(src, len)?;
        self.validate_range(dst, len)?;
        self.check_non_overlapping(dst, src, len)?;
        self.memory.copy_within(src..src + len, dst);
        Ok(())
    }
}

impl Drop for WasmAllocator {
    fn drop(&mut self) { self.free(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExceptionKind;

    #[test]
    fn alloc_and_bounds() {
        let mut allocator = WasmAllocator::new(64);
        assert_eq!(allocator.alloc(16).unwrap(), 0);
        assert_eq!(allocator.alloc(16).unwrap(), 16);
        assert!(allocator.is_in_range(31));
        assert!(!allocator.is_in_range(32));

        allocator.write(4, b"wasm").unwrap();
        assert_eq!(allocator.read(4, 4).unwrap(), b"wasm");

        let err = allocator.read(30, 4).unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::WasmMemory);
        let err = allocator.alloc(40).unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::WasmMemory);
        assert!(allocator.validate_range(usize::MAX, 2).is_err());
    }

    #[test]
    fn memcpy_rejects_aliasing() {
        let mut allocator = WasmAllocator::new(64);
        allocator.alloc(32).unwrap();
        allocator.write(0, b"abcd").unwrap();
        allocator.memcpy(8, 0, 4).unwrap();
        assert_eq!(allocator.read(8, 4).unwrap(), b"abcd");

        let err = allocator.memcpy(2, 0, 4).unwrap_err();
        assert_eq!(err.kind(), ExceptionKind::OverlappingMemory);
        assert!(allocator.check_non_overlapping(4, 0, 4).is_ok());
    }

    #[test]
    fn free_is_idempotent() {
        let mut allocator = WasmAllocator::new(64);
        allocator.alloc(8).unwrap();
        allocator.free();
        allocator.free();
        assert!(allocator.is_released());
        assert_eq!(allocator.size(), 0);
        assert_eq!(
            allocator.alloc(1).unwrap_err().kind(),
            ExceptionKind::WasmMemory
        );
    }
}
