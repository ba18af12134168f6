//! # ll-verify: pagination proofs
//!
//! Kani harnesses over `ll_core::params::page_offset`, the arithmetic
//! every provider uses to turn `(page, page_size)` into a row window.
//!
//! # Proof: Window soundness
//!
//! Whenever a window is defined it starts at `(page - 1) * page_size`, its
//! last row still fits in an `i64`, and it is immediately followed by the
//! window of the next page (when that one is defined too). Pages therefore
//! tile the result with no gap or overlap, and row numbers
//! (`offset + 1 ..= offset + page_size`) never collide. Windows past
//! `i64::MAX` rows are rejected, never wrapped.

extern crate ll_core;

#[cfg(kani)]
use ll_core::params::page_offset;

#[cfg(kani)]
mod proofs {
    use super::*;

    /// **Proof: Zero page or zero size has no window**
    #[kani::proof]
    fn verify_zero_rejected() {
        let n: u32 = kani::any();
        assert!(page_offset(0, n).is_none());
        assert!(page_offset(n, 0).is_none());
    }

    /// **Proof: Offset formula**
    ///
    /// A window is defined exactly when its last row fits in an `i64`, and
    /// then starts at `(page - 1) * page_size`.
    #[kani::proof]
    fn verify_offset_formula() {
        let page: u32 = kani::any();
        let size: u32 = kani::any();
        kani::assume(page > 0 && size > 0);

        let start = i128::from(page - 1) * i128::from(size);
        let last = start + i128::from(size);
        match page_offset(page, size) {
            Some(offset) => {
                assert!(last <= i128::from(i64::MAX));
                assert!(offset >= 0);
                assert!(i128::from(offset) == start);
            }
            None => assert!(last > i128::from(i64::MAX), "valid window rejected"),
        }
    }

    /// **Proof: Consecutive pages are contiguous**
    #[kani::proof]
    fn verify_pages_contiguous() {
        let page: u32 = kani::any();
        let size: u32 = kani::any();
        kani::assume(page > 0 && page < u32::MAX && size > 0);

        let next = page_offset(page + 1, size);
        kani::assume(next.is_some());
        let this = page_offset(page, size);
        assert!(this.is_some(), "page before a defined window is undefined");
        assert!(
            next.unwrap() == this.unwrap() + i64::from(size),
            "gap or overlap between pages"
        );
    }
}

#[cfg(not(kani))]
pub fn _proof_placeholder() {
    // Run `cargo kani --package ll-verify` to execute proofs.
}
