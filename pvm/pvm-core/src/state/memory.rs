use crate::utils::VMUtils;
use jam_pvm_types::{
    common::MemAddress,
    constants::{FORBIDDEN_ZONE_END, PAGE_SIZE, TOTAL_PAGES},
    exit_reason::ExitReason,
};
use std::{collections::BTreeMap, ops::Range};
use thiserror::Error;

pub type PageIndex = u32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Forbidden memory access (address below 2^16 or wrapping): {0}")]
    Forbidden(MemAddress),
    #[error("Invalid page index: {0}")]
    InvalidPageIndex(u64),
    #[error("Memory access violation: (page address: {0})")]
    AccessViolation(MemAddress),
    #[error("Invalid heap break. Pointer: {pointer}, Requested: {requested}, Heap End: {end}")]
    InvalidSbrk {
        pointer: MemAddress,
        requested: MemAddress,
        end: MemAddress,
    },
}

impl MemoryError {
    /// Maps an access failure onto the exit reason the guest observes.
    /// Returns `None` for failures that are not caused by the guest program.
    pub fn as_exit_reason(&self) -> Option<ExitReason> {
        match self {
            Self::Forbidden(_) => Some(ExitReason::Panic),
            Self::AccessViolation(address) => Some(ExitReason::PageFault(*address)),
            _ => None,
        }
    }
}

/// Memory Page Access Types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessType {
    #[default]
    Inaccessible,
    ReadOnly,
    ReadWrite,
}

impl AccessType {
    #[inline(always)]
    fn is_readable(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    #[inline(always)]
    fn is_writable(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

/// A single accessible page. Inaccessible pages are not stored at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryPage {
    pub access: AccessType,
    data: Box<[u8; PAGE_SIZE]>,
}

impl MemoryPage {
    fn new(access: AccessType) -> Self {
        Self {
            access,
            data: Box::new([0; PAGE_SIZE]),
        }
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }
}

/// Heap break descriptor driven by the `sbrk` instruction.
///
/// `pointer` only moves forward and stays within `start..=end`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Heap {
    pub start: MemAddress,
    pub end: MemAddress,
    pub pointer: MemAddress,
}

impl Heap {
    pub fn new(start: MemAddress, end: MemAddress) -> Self {
        Self {
            start,
            end,
            pointer: start,
        }
    }
}

/// `μ`: Page-granular RAM over the 32-bit address space.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memory {
    pages: BTreeMap<PageIndex, MemoryPage>,
    pub heap: Heap,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn get_page_and_offset(address: MemAddress) -> (PageIndex, usize) {
        let page_index = address / PAGE_SIZE as MemAddress;
        let offset = (address % PAGE_SIZE as MemAddress) as usize;
        (page_index, offset)
    }

    /// Number of pages that are currently accessible.
    pub fn accessible_page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_access(&self, page_index: PageIndex) -> AccessType {
        self.pages
            .get(&page_index)
            .map(|page| page.access)
            .unwrap_or_default()
    }

    /// Sets the access type of a single page. Making a page inaccessible drops its content.
    pub fn change_acl(
        &mut self,
        page_index: PageIndex,
        access: AccessType,
    ) -> Result<(), MemoryError> {
        if page_index as usize >= TOTAL_PAGES {
            return Err(MemoryError::InvalidPageIndex(page_index as u64));
        }
        match access {
            AccessType::Inaccessible => {
                self.pages.remove(&page_index);
            }
            _ => {
                self.pages
                    .entry(page_index)
                    .and_modify(|page| page.access = access)
                    .or_insert_with(|| MemoryPage::new(access));
            }
        }
        Ok(())
    }

    /// Sets the access type for a range of memory pages.
    pub fn set_page_range_access(
        &mut self,
        page_range: Range<u64>,
        access: AccessType,
    ) -> Result<(), MemoryError> {
        for page_index in page_range {
            let page_index = PageIndex::try_from(page_index)
                .map_err(|_| MemoryError::InvalidPageIndex(page_index))?;
            self.change_acl(page_index, access)?;
        }
        Ok(())
    }

    /// Sets the access type for every page touched by the given address range.
    pub fn set_address_range_access(
        &mut self,
        address_range: Range<MemAddress>,
        access: AccessType,
    ) -> Result<(), MemoryError> {
        if address_range.is_empty() {
            return Ok(());
        }
        let start_page = address_range.start as u64 / PAGE_SIZE as u64;
        let end_page = (address_range.end as u64).div_ceil(PAGE_SIZE as u64);
        self.set_page_range_access(start_page..end_page, access)
    }

    /// Validates that every byte of `[address, address + length)` may be accessed.
    ///
    /// Ranges touching the forbidden zone or wrapping past `2^32` are `Forbidden`.
    /// Otherwise the first page lacking the permission is reported by its start address.
    fn check_access(
        &self,
        address: MemAddress,
        length: usize,
        permitted: fn(AccessType) -> bool,
    ) -> Result<(), MemoryError> {
        if length == 0 {
            return Ok(());
        }
        if address < FORBIDDEN_ZONE_END {
            return Err(MemoryError::Forbidden(address));
        }
        let last = address as u64 + length as u64 - 1;
        if last > MemAddress::MAX as u64 {
            return Err(MemoryError::Forbidden(address));
        }
        let (start_page, _) = Self::get_page_and_offset(address);
        let (end_page, _) = Self::get_page_and_offset(last as MemAddress);
        match (start_page..=end_page).find(|&page| !permitted(self.page_access(page))) {
            Some(page) => Err(MemoryError::AccessViolation(page * PAGE_SIZE as MemAddress)),
            None => Ok(()),
        }
    }

    pub fn check_readable(&self, address: MemAddress, length: usize) -> Result<(), MemoryError> {
        self.check_access(address, length, AccessType::is_readable)
    }

    pub fn check_writable(&self, address: MemAddress, length: usize) -> Result<(), MemoryError> {
        self.check_access(address, length, AccessType::is_writable)
    }

    /// Check if a range of memory cells is readable.
    pub fn is_address_range_readable(&self, start: MemAddress, length: usize) -> bool {
        self.check_readable(start, length).is_ok()
    }

    /// Check if a range of memory cells is writable.
    pub fn is_address_range_writable(&self, start: MemAddress, length: usize) -> bool {
        self.check_writable(start, length).is_ok()
    }

    /// Read a specified number of bytes from memory starting at the given address.
    pub fn read_bytes(&self, address: MemAddress, length: usize) -> Result<Vec<u8>, MemoryError> {
        self.check_readable(address, length)?;
        let mut buf = Vec::with_capacity(length);
        let mut cursor = address;
        while buf.len() < length {
            let (page_index, offset) = Self::get_page_and_offset(cursor);
            let chunk = (PAGE_SIZE - offset).min(length - buf.len());
            let page = self
                .pages
                .get(&page_index)
                .ok_or(MemoryError::AccessViolation(VMUtils::page_start_address(cursor)))?;
            buf.extend_from_slice(&page.data[offset..offset + chunk]);
            cursor = cursor.wrapping_add(chunk as MemAddress);
        }
        Ok(buf)
    }

    /// Write a slice of bytes to memory starting at the given address.
    ///
    /// Either every byte is written or none is.
    pub fn write_bytes(&mut self, address: MemAddress, bytes: &[u8]) -> Result<(), MemoryError> {
        self.check_writable(address, bytes.len())?;
        let mut written = 0;
        let mut cursor = address;
        while written < bytes.len() {
            let (page_index, offset) = Self::get_page_and_offset(cursor);
            let chunk = (PAGE_SIZE - offset).min(bytes.len() - written);
            let page = self
                .pages
                .get_mut(&page_index)
                .ok_or(MemoryError::AccessViolation(VMUtils::page_start_address(cursor)))?;
            page.data[offset..offset + chunk].copy_from_slice(&bytes[written..written + chunk]);
            written += chunk;
            cursor = cursor.wrapping_add(chunk as MemAddress);
        }
        Ok(())
    }

    /// Moves the heap pointer forward to `new_pointer`, making the covered pages writable.
    ///
    /// Returns the previous pointer.
    pub fn grow_heap(&mut self, new_pointer: MemAddress) -> Result<MemAddress, MemoryError> {
        let Heap { end, pointer, .. } = self.heap;
        if new_pointer < pointer || new_pointer > end {
            return Err(MemoryError::InvalidSbrk {
                pointer,
                requested: new_pointer,
                end,
            });
        }
        self.set_address_range_access(pointer..new_pointer, AccessType::ReadWrite)?;
        self.heap.pointer = new_pointer;
        Ok(pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    const BASE: MemAddress = 0x2_0000;

    fn rw_memory(pages: u32) -> Result<Memory, MemoryError> {
        let mut memory = Memory::new();
        memory.set_address_range_access(
            BASE..BASE + pages * PAGE_SIZE as MemAddress,
            AccessType::ReadWrite,
        )?;
        Ok(memory)
    }

    #[test]
    fn test_read_write_across_pages() -> Result<(), Box<dyn Error>> {
        let mut memory = rw_memory(2)?;
        let address = BASE + PAGE_SIZE as MemAddress - 2;
        memory.write_bytes(address, &[1, 2, 3, 4])?;
        assert_eq!(memory.read_bytes(address, 4)?, vec![1, 2, 3, 4]);
        Ok(())
    }

    #[test]
    fn test_forbidden_zone() {
        let memory = Memory::new();
        assert_eq!(
            memory.read_bytes(0xffff, 1),
            Err(MemoryError::Forbidden(0xffff))
        );
        assert_eq!(
            memory.check_readable(MemAddress::MAX, 2),
            Err(MemoryError::Forbidden(MemAddress::MAX))
        );
    }

    #[test]
    fn test_zero_length_access_is_always_allowed() {
        let memory = Memory::new();
        assert!(memory.is_address_range_readable(0, 0));
        assert_eq!(memory.read_bytes(0, 0), Ok(vec![]));
    }

    #[test]
    fn test_no_partial_write() -> Result<(), Box<dyn Error>> {
        let mut memory = rw_memory(1)?;
        let address = BASE + PAGE_SIZE as MemAddress - 1;
        let result = memory.write_bytes(address, &[0xaa, 0xbb]);
        assert_eq!(
            result,
            Err(MemoryError::AccessViolation(BASE + PAGE_SIZE as MemAddress))
        );
        assert_eq!(memory.read_bytes(address, 1)?, vec![0]);
        Ok(())
    }

    #[test]
    fn test_read_only_page() -> Result<(), Box<dyn Error>> {
        let mut memory = rw_memory(1)?;
        memory.write_bytes(BASE, &[7])?;
        memory.change_acl(BASE / PAGE_SIZE as MemAddress, AccessType::ReadOnly)?;
        assert_eq!(memory.read_bytes(BASE, 1)?, vec![7]);
        assert_eq!(
            memory.write_bytes(BASE + 5, &[1]),
            Err(MemoryError::AccessViolation(BASE))
        );
        Ok(())
    }

    #[test]
    fn test_inaccessible_drops_page() -> Result<(), Box<dyn Error>> {
        let mut memory = rw_memory(3)?;
        assert_eq!(memory.accessible_page_count(), 3);
        memory.change_acl(BASE / PAGE_SIZE as MemAddress + 1, AccessType::Inaccessible)?;
        assert_eq!(memory.accessible_page_count(), 2);
        assert!(!memory.is_address_range_readable(BASE, 3 * PAGE_SIZE));
        Ok(())
    }

    #[test]
    fn test_invalid_page_index() {
        let mut memory = Memory::new();
        assert_eq!(
            memory.change_acl(TOTAL_PAGES as PageIndex, AccessType::ReadOnly),
            Err(MemoryError::InvalidPageIndex(TOTAL_PAGES as u64))
        );
        assert_eq!(memory.accessible_page_count(), 0);
    }

    #[test]
    fn test_grow_heap() -> Result<(), Box<dyn Error>> {
        let mut memory = Memory::new();
        memory.heap = Heap::new(BASE, BASE + 4 * PAGE_SIZE as MemAddress);
        assert!(!memory.is_address_range_writable(BASE, 1));

        assert_eq!(memory.grow_heap(BASE + 10)?, BASE);
        assert!(memory.is_address_range_writable(BASE, PAGE_SIZE));
        assert_eq!(memory.heap.pointer, BASE + 10);

        // Backwards and past-the-end requests are rejected without moving the pointer.
        assert!(memory.grow_heap(BASE).is_err());
        assert!(memory.grow_heap(BASE + 5 * PAGE_SIZE as MemAddress).is_err());
        assert_eq!(memory.heap.pointer, BASE + 10);
        Ok(())
    }

    #[test]
    fn test_error_to_exit_reason() {
        assert_eq!(
            MemoryError::Forbidden(1).as_exit_reason(),
            Some(ExitReason::Panic)
        );
        assert_eq!(
            MemoryError::AccessViolation(BASE).as_exit_reason(),
            Some(ExitReason::PageFault(BASE))
        );
        assert_eq!(MemoryError::InvalidPageIndex(0).as_exit_reason(), None);
    }
}
