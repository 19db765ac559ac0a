//! Access-mode resolution for new and derived facts.
//!
//! A fact created in reference to another fact may never be more visible
//! than its reference: broadening access transitively would leak the
//! restrictive parent's existence. The resolver enforces that here, before
//! any write happens.

use crate::types::AccessMode;

/// Error type for access-policy resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// The requested mode would widen access relative to the referenced fact.
    #[error("requested access mode {requested} is less restrictive than referenced fact's {reference}")]
    InvalidPolicy {
        /// Mode the client asked for.
        requested: AccessMode,
        /// Mode of the referenced fact.
        reference: AccessMode,
    },
}

/// Resolve the effective access mode for a new or derived fact.
///
/// - both absent: `Ok(None)`, the caller must supply a default;
/// - only `reference`: inherit the referenced fact's mode;
/// - only `requested`: use the requested mode;
/// - both: the requested mode must be at least as restrictive as the
///   reference, otherwise `PolicyError::InvalidPolicy`.
///
/// Pure and total; no I/O.
pub fn resolve_access_mode(
    requested: Option<AccessMode>,
    reference: Option<AccessMode>,
) -> Result<Option<AccessMode>, PolicyError> {
    match (requested, reference) {
        (None, None) => Ok(None),
        (None, Some(reference)) => Ok(Some(reference)),
        (Some(requested), None) => Ok(Some(requested)),
        (Some(requested), Some(reference)) => {
            if requested < reference {
                Err(PolicyError::InvalidPolicy {
                    requested,
                    reference,
                })
            } else {
                Ok(Some(requested))
            }
        }
    }
}
