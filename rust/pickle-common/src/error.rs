use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn truncated_read(element: impl Into<String>, requested: usize, remaining: usize) -> Error {
        Error(
            ErrorKind::TruncatedRead {
                element: element.into(),
                requested,
                remaining,
            }
            .into(),
        )
    }

    pub fn length_overflow(element: impl Into<String>, count: u64, element_size: usize) -> Error {
        Error(
            ErrorKind::LengthOverflow {
                element: element.into(),
                count,
                element_size,
            }
            .into(),
        )
    }

    pub fn allocation_failure(requested: usize) -> Error {
        Error(ErrorKind::AllocationFailure { requested }.into())
    }

    /// Returns `true` if the error was caused by running past the end of the
    /// readable data.
    pub fn is_truncated(&self) -> bool {
        matches!(self.kind(), ErrorKind::TruncatedRead { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid pickle data for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error(
        "truncated read of '{element}': {requested} bytes requested, {remaining} remaining"
    )]
    TruncatedRead {
        element: String,
        requested: usize,
        remaining: usize,
    },

    #[error("length overflow for '{element}': {count} elements of {element_size} bytes")]
    LengthOverflow {
        element: String,
        count: u64,
        element_size: usize,
    },

    #[error("failed to allocate pickle buffer of {requested} bytes")]
    AllocationFailure { requested: usize },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_roundtrip() {
        let err = Error::truncated_read("u32", 4, 2);
        assert!(err.is_truncated());
        assert_eq!(
            err.to_string(),
            "truncated read of 'u32': 4 bytes requested, 2 remaining"
        );
        match err.into_kind() {
            ErrorKind::TruncatedRead {
                element,
                requested,
                remaining,
            } => {
                assert_eq!(element, "u32");
                assert_eq!(requested, 4);
                assert_eq!(remaining, 2);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = Error::length_overflow("string", u64::MAX, 2);
        assert!(!err.is_truncated());
        assert!(err.to_string().contains("length overflow"));

        let err = Error::allocation_failure(1 << 20);
        assert_eq!(
            err.to_string(),
            "failed to allocate pickle buffer of 1048576 bytes"
        );

        let err = Error::invalid_format("count", "negative");
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }
}
