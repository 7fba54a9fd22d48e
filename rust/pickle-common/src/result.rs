//! `Result` alias and the `verify_*` precondition macros.

use crate::error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `InvalidArgument` from the enclosing function unless `$cond` holds.
///
/// The error names the argument and the condition that failed.
#[macro_export]
macro_rules! verify_arg {
    ($name:ident, $cond:expr) => {
        if !$cond {
            return Err($crate::result::failed_arg(stringify!($name), stringify!($cond)).into());
        }
    };
}

/// Returns `InvalidFormat` from the enclosing function unless `$cond` holds.
///
/// Meant for values decoded from untrusted bytes.
#[macro_export]
macro_rules! verify_data {
    ($element:ident, $cond:expr) => {
        if !$cond {
            return Err($crate::result::failed_data(stringify!($element), stringify!($cond)).into());
        }
    };
}

#[cold]
#[doc(hidden)]
pub fn failed_arg(name: &str, condition: &str) -> Error {
    Error::invalid_arg(name, format!("expected {condition}"))
}

#[cold]
#[doc(hidden)]
pub fn failed_data(element: &str, condition: &str) -> Error {
    Error::invalid_format(element, format!("expected {condition}"))
}
