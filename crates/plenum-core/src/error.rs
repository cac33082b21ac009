//! Floor control error types.

use crate::ports::StoreError;

/// Errors from the floor lock protocol.
///
/// None of these are fatal: `FloorBusy` is a user-facing retry prompt, and
/// `StoreUnavailable` means "could not confirm floor state" — callers must
/// fail closed (do not start capture, stop capture on repeated ambiguity).
#[derive(Debug, thiserror::Error)]
pub enum FloorError {
    /// Another participant holds a non-expired lease on the floor.
    #[error("floor is held by another participant: {holder_id}")]
    FloorBusy {
        /// Identity of the current holder.
        holder_id: String,
    },

    /// The lock store could not be reached or failed the operation.
    #[error("could not confirm floor state: {0}")]
    StoreUnavailable(#[from] StoreError),
}
