use thiserror::Error;

/// Errors that can occur constructing a [`crate::Queue`].
///
/// `InvalidUsage` conditions (zero `elem_size`, double-releasing a handle)
/// are programming errors checked with `debug_assert!` rather than modeled
/// here — see SPEC_FULL.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// `elem_size * capacity` cannot be represented in a `usize` for the
    /// requested element size and limit.
    #[error("requested capacity overflows usize for elem_size {elem_size}")]
    AllocFailure {
        /// The element size that was requested.
        elem_size: usize,
    },
}
