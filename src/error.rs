// src/error.rs
//
// Error kinds shared by every effect in the family.

use thiserror::Error;

/// Status code for a successful call across the C ABI.
pub const STATUS_OK: i32 = 0;
pub const STATUS_INVALID_ARGUMENT: i32 = -1;
pub const STATUS_ILLEGAL_STATE: i32 = -2;
pub const STATUS_ALREADY_EXISTS: i32 = -3;
pub const STATUS_NOT_FOUND: i32 = -4;
/// An internal fault (caught panic) on the C ABI.
pub const STATUS_INTERNAL: i32 = -5;

/// Error returned by effect lifecycle, parameter and processing calls.
///
/// Details are `&'static str`; building an error never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EffectError {
    /// Bad parameter value or tag, bad buffer or sample count.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The call needs a context that does not exist (or a state the
    /// instance is not in).
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    /// A context is already active for this instance.
    #[error("already exists: {0}")]
    AlreadyExists(&'static str),

    /// Unknown parameter tag on a read, or nothing to read from.
    #[error("not found: {0}")]
    NotFound(&'static str),
}

impl EffectError {
    /// Stable integer code used by the C ABI.
    pub fn status_code(&self) -> i32 {
        match self {
            EffectError::InvalidArgument(_) => STATUS_INVALID_ARGUMENT,
            EffectError::IllegalState(_) => STATUS_ILLEGAL_STATE,
            EffectError::AlreadyExists(_) => STATUS_ALREADY_EXISTS,
            EffectError::NotFound(_) => STATUS_NOT_FOUND,
        }
    }
}

/// Result of an effect call.
pub type EffectResult<T> = Result<T, EffectError>;

/// Collapse a result into a C ABI status code.
pub fn status_of<T>(result: &EffectResult<T>) -> i32 {
    match result {
        Ok(_) => STATUS_OK,
        Err(e) => e.status_code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_distinct() {
        let codes = [
            EffectError::InvalidArgument("x").status_code(),
            EffectError::IllegalState("x").status_code(),
            EffectError::AlreadyExists("x").status_code(),
            EffectError::NotFound("x").status_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            assert!(*a < STATUS_OK);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_display_includes_detail() {
        let err = EffectError::InvalidArgument("echo delay out of range");
        assert_eq!(err.to_string(), "invalid argument: echo delay out of range");
        assert_eq!(status_of::<()>(&Err(err)), STATUS_INVALID_ARGUMENT);
        assert_eq!(status_of(&Ok(3)), STATUS_OK);
    }
}
