// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splitting of buffered writes into page-write transactions
//!
//! A page write may not cross a page boundary. A write of `len` bytes at
//! `start` becomes:
//!
//! - one segment of `len` bytes when `len` is shorter than a page, whatever
//!   the alignment of `start`;
//! - otherwise a head segment up to the next boundary (absent when `start`
//!   is aligned), one segment per whole page, and a tail segment shorter
//!   than a page (absent when the write ends on a boundary).
//!
//! A short write that straddles a boundary is therefore issued as a single
//! transaction, and the device wraps its tail around within the page.
//!
//! [`pages`] drops the short-write rule and splits every write at every page
//! boundary, as page programming of NOR flash requires.

/// One page-write transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Segment {
    /// Device address of the first byte
    pub address: u32,
    /// Offset of the first byte in the source buffer
    pub offset: usize,
    pub len: usize,
}

/// Iterator over the segments of a buffered write
#[derive(Clone, Debug)]
pub struct Segments {
    address: u32,
    offset: usize,
    remaining: usize,
    page_size: u32,
    whole: bool,
}

/// Splits a write of `len` bytes at `start` into page-write segments.
///
/// A `page_size` of zero disables splitting.
pub fn segments(start: u32, len: usize, page_size: u32) -> Segments {
    Segments {
        address: start,
        offset: 0,
        remaining: len,
        page_size,
        whole: page_size == 0 || len < page_size as usize,
    }
}

/// Splits a write of `len` bytes at `start` at every page boundary, short
/// writes included.
///
/// A `page_size` of zero disables splitting.
pub fn pages(start: u32, len: usize, page_size: u32) -> Segments {
    Segments {
        whole: page_size == 0,
        ..segments(start, len, page_size)
    }
}

impl Iterator for Segments {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.remaining == 0 {
            return None;
        }

        let len = if self.whole {
            self.remaining
        } else {
            let to_boundary = self.page_size - self.address % self.page_size;
            self.remaining.min(to_boundary as usize)
        };

        let segment = Segment {
            address: self.address,
            offset: self.offset,
            len,
        };
        self.address = self.address.wrapping_add(len as u32);
        self.offset += len;
        self.remaining -= len;
        Some(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lengths(start: u32, len: usize, page: u32) -> Vec<usize> {
        segments(start, len, page).map(|s| s.len).collect()
    }

    #[test]
    fn unaligned_start_splits_at_the_boundary() {
        assert_eq!(
            segments(10, 20, 16).collect::<Vec<_>>(),
            vec![
                Segment { address: 10, offset: 0, len: 6 },
                Segment { address: 16, offset: 6, len: 14 },
            ]
        );
    }

    #[test]
    fn aligned_full_page_is_one_segment() {
        assert_eq!(lengths(16, 16, 16), vec![16]);
    }

    #[test]
    fn short_write_is_one_segment() {
        assert_eq!(lengths(0, 5, 16), vec![5]);
        assert_eq!(lengths(14, 5, 16), vec![5]);
    }

    #[test]
    fn head_pages_and_tail() {
        assert_eq!(lengths(5, 40, 8), vec![3, 8, 8, 8, 8, 5]);
        assert_eq!(lengths(0, 24, 8), vec![8, 8, 8]);
    }

    #[test]
    fn empty_writes_issue_nothing() {
        assert_eq!(segments(7, 0, 8).count(), 0);
    }

    #[test]
    fn zero_page_size_disables_splitting() {
        assert_eq!(lengths(3, 300, 0), vec![300]);
    }

    #[test]
    fn pages_split_short_writes_at_the_boundary() {
        assert_eq!(
            pages(0xF0, 20, 256).collect::<Vec<_>>(),
            vec![
                Segment { address: 0xF0, offset: 0, len: 16 },
                Segment { address: 0x100, offset: 16, len: 4 },
            ]
        );
        assert_eq!(pages(0x10, 20, 256).map(|s| s.len).collect::<Vec<_>>(), vec![20]);
        assert_eq!(pages(5, 40, 8).map(|s| s.len).collect::<Vec<_>>(), vec![3, 8, 8, 8, 8, 5]);
    }

    proptest! {
        #[test]
        fn lengths_sum_to_the_write(start in 0u32..4096, len in 0usize..4096, page in 1u32..300) {
            prop_assert_eq!(lengths(start, len, page).iter().sum::<usize>(), len);
        }

        #[test]
        fn segments_are_contiguous(start in 0u32..4096, len in 0usize..4096, page in 1u32..300) {
            let mut address = start;
            let mut offset = 0;
            for segment in segments(start, len, page) {
                prop_assert_eq!(segment.address, address);
                prop_assert_eq!(segment.offset, offset);
                address += segment.len as u32;
                offset += segment.len;
            }
        }

        #[test]
        fn long_writes_never_cross_a_boundary(start in 0u32..4096, len in 0usize..4096, page in 1u32..300) {
            prop_assume!(len >= page as usize);
            for segment in segments(start, len, page) {
                let first_page = segment.address / page;
                let last_page = (segment.address + segment.len as u32 - 1) / page;
                prop_assert_eq!(first_page, last_page);
            }
        }

        #[test]
        fn aligned_long_writes_have_no_head(page_index in 0u32..16, len in 0usize..4096, page in 1u32..300) {
            prop_assume!(len >= page as usize);
            let first = segments(page_index * page, len, page).next();
            prop_assert_eq!(first.map(|s| s.len), Some(page as usize));
        }

        #[test]
        fn pages_never_cross_a_boundary(start in 0u32..4096, len in 0usize..4096, page in 1u32..300) {
            let mut total = 0;
            for segment in pages(start, len, page) {
                let first_page = segment.address / page;
                let last_page = (segment.address + segment.len as u32 - 1) / page;
                prop_assert_eq!(first_page, last_page);
                total += segment.len;
            }
            prop_assert_eq!(total, len);
        }

        #[test]
        fn short_writes_are_a_single_segment(start in 0u32..4096, page in 2u32..300, len in 1usize..300) {
            prop_assume!(len < page as usize);
            let all: Vec<Segment> = segments(start, len, page).collect();
            prop_assert_eq!(all, vec![Segment { address: start, offset: 0, len }]);
        }
    }
}
