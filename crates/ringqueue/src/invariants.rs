//! Debug assertion macros for ring and queue invariants.
//!
//! These macros provide runtime checks for the invariants documented in
//! `SPEC_FULL.md` §8. They are only active in debug builds
//! (`#[cfg(debug_assertions)]`), so there is zero overhead in release builds.

// =============================================================================
// INV-Q-01: Bounded Count
// =============================================================================

/// Assert that `elem_count` never exceeds `capacity`, and `capacity` never
/// exceeds `max_cap`.
///
/// **Invariant**: `0 ≤ elem_count ≤ capacity ≤ max_cap`
macro_rules! debug_assert_bounded_count {
    ($elem_count:expr, $capacity:expr, $max_cap:expr) => {
        debug_assert!(
            $elem_count <= $capacity,
            "INV-Q-01 violated: elem_count {} exceeds capacity {}",
            $elem_count,
            $capacity
        );
        debug_assert!(
            $capacity <= $max_cap,
            "INV-Q-01 violated: capacity {} exceeds max_cap {}",
            $capacity,
            $max_cap
        );
    };
}

// =============================================================================
// INV-Q-02: Minimum Capacity Floor
// =============================================================================

/// Assert that capacity never drops below `min_cap`.
///
/// **Invariant**: `min_cap ≤ capacity`
macro_rules! debug_assert_min_cap_floor {
    ($min_cap:expr, $capacity:expr) => {
        debug_assert!(
            $min_cap <= $capacity,
            "INV-Q-02 violated: capacity {} below min_cap {}",
            $capacity,
            $min_cap
        )
    };
}

// =============================================================================
// INV-Q-03: Cursor Bounds
// =============================================================================

/// Assert that a byte cursor lies in `[0, capacity_bytes)`, never at the
/// one-past-the-end position (which must be wrapped to zero instead).
///
/// **Invariant**: `begin`, `end` ∈ `[0, capacity_bytes)`
macro_rules! debug_assert_cursor_in_bounds {
    ($name:literal, $cursor:expr, $capacity_bytes:expr) => {
        debug_assert!(
            $capacity_bytes == 0 || $cursor < $capacity_bytes,
            "INV-Q-03 violated: {} cursor {} not in [0, {})",
            $name,
            $cursor,
            $capacity_bytes
        )
    };
}

// =============================================================================
// INV-Q-04: Wrap Accounting
// =============================================================================

/// Assert that the occupied byte span matches `elem_count * elem_size`,
/// accounting for wrap-around.
///
/// **Invariant**: see SPEC_FULL.md §3, "Wrap invariant".
macro_rules! debug_assert_wrap_accounting {
    ($begin:expr, $end:expr, $capacity_bytes:expr, $occupied_bytes:expr) => {
        debug_assert!(
            if $begin <= $end {
                $end - $begin == $occupied_bytes
            } else {
                ($capacity_bytes - $begin) + $end == $occupied_bytes
            },
            "INV-Q-04 violated: begin={} end={} capacity_bytes={} occupied_bytes={}",
            $begin,
            $end,
            $capacity_bytes,
            $occupied_bytes
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_cursor_in_bounds;
pub(crate) use debug_assert_min_cap_floor;
pub(crate) use debug_assert_wrap_accounting;
