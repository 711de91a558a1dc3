// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Bookkeeping for a small pool of identical hardware resources.
//!
//! Used for whole channels (timers, GPIOTE channels, PPI channels) as well as
//! for the capture/compare registers inside one timer. Up to 32 entries.

use core::cell::Cell;

use kernel::ErrorCode;

pub struct LeaseSet {
    leased: Cell<u32>,
    size: usize,
}

impl LeaseSet {
    pub const fn new(size: usize) -> LeaseSet {
        LeaseSet {
            leased: Cell::new(0),
            size: if size > 32 { 32 } else { size },
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Take the lowest free entry.
    pub fn acquire(&self) -> Option<usize> {
        let leased = self.leased.get();
        let index = (0..self.size).find(|i| leased & (1 << i) == 0)?;
        self.leased.set(leased | (1 << index));
        Some(index)
    }

    pub fn release(&self, index: usize) -> Result<(), ErrorCode> {
        if !self.is_leased(index) {
            return Err(ErrorCode::ALREADY);
        }
        self.leased.set(self.leased.get() & !(1 << index));
        Ok(())
    }

    pub fn is_leased(&self, index: usize) -> bool {
        index < self.size && self.leased.get() & (1 << index) != 0
    }

    pub fn outstanding(&self) -> usize {
        self.leased.get().count_ones() as usize
    }

    pub fn release_all(&self) {
        self.leased.set(0);
    }
}

#[cfg(test)]
mod tests {
    use super::LeaseSet;
    use kernel::ErrorCode;

    #[test]
    fn hands_out_lowest_free_entry() {
        let set = LeaseSet::new(3);
        assert_eq!(set.acquire(), Some(0));
        assert_eq!(set.acquire(), Some(1));
        assert_eq!(set.release(0), Ok(()));
        assert_eq!(set.acquire(), Some(0));
        assert_eq!(set.acquire(), Some(2));
        assert_eq!(set.acquire(), None);
        assert_eq!(set.outstanding(), 3);
    }

    #[test]
    fn double_release_is_reported() {
        let set = LeaseSet::new(2);
        let index = set.acquire().unwrap();
        assert_eq!(set.release(index), Ok(()));
        assert_eq!(set.release(index), Err(ErrorCode::ALREADY));
        assert_eq!(set.release(7), Err(ErrorCode::ALREADY));
        assert_eq!(set.outstanding(), 0);
    }

    #[test]
    fn empty_set_never_leases() {
        let set = LeaseSet::new(0);
        assert_eq!(set.acquire(), None);
        assert!(!set.is_leased(0));
    }
}
