use pickle_bytes::GrowthPolicy;
use pickle_common::{Result, verify_arg};

use crate::format::{HEADER_SIZE, MAX_PAYLOAD_SIZE};

/// Construction options for an owned [`Pickle`](crate::Pickle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickleOptions {
    /// Payload bytes to reserve up front.
    pub initial_capacity: usize,
    /// Capacity is grown in multiples of this many bytes. Must be a power of two.
    pub allocation_unit: usize,
    /// Upper bound on the total buffer size (header included). Writes that
    /// would need more fail with `AllocationFailure`.
    pub max_capacity: usize,
}

impl PickleOptions {
    pub const DEFAULT_ALLOCATION_UNIT: usize = GrowthPolicy::DEFAULT_ALLOCATION_UNIT;

    /// Largest `max_capacity` that still fits the header's `u32` payload size.
    pub const MAX_CAPACITY: usize = HEADER_SIZE.saturating_add(MAX_PAYLOAD_SIZE);

    pub fn new() -> PickleOptions {
        Default::default()
    }

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_allocation_unit(mut self, allocation_unit: usize) -> Self {
        self.allocation_unit = allocation_unit;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        verify_arg!(allocation_unit, self.allocation_unit.is_power_of_two());
        verify_arg!(max_capacity, self.max_capacity >= HEADER_SIZE);
        Ok(())
    }

    pub(crate) fn growth_policy(&self) -> GrowthPolicy {
        GrowthPolicy::new(
            self.allocation_unit,
            self.max_capacity.min(Self::MAX_CAPACITY),
        )
    }
}

impl Default for PickleOptions {
    fn default() -> Self {
        PickleOptions {
            initial_capacity: Self::DEFAULT_ALLOCATION_UNIT - HEADER_SIZE,
            allocation_unit: Self::DEFAULT_ALLOCATION_UNIT,
            max_capacity: Self::MAX_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use pickle_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_default_options() {
        let options = PickleOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.initial_capacity + HEADER_SIZE, 64);
        let policy = options.growth_policy();
        assert_eq!(policy.allocation_unit(), 64);
        assert_eq!(policy.max_capacity(), PickleOptions::MAX_CAPACITY);
    }

    #[test]
    fn test_invalid_options() {
        let err = PickleOptions::new()
            .with_allocation_unit(100)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidArgument { name, .. } if name == "allocation_unit"
        ));

        let err = PickleOptions::new()
            .with_max_capacity(2)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidArgument { name, .. } if name == "max_capacity"
        ));
    }

    #[test]
    fn test_max_capacity_clamped() {
        let options = PickleOptions::new().with_max_capacity(usize::MAX);
        assert_eq!(
            options.growth_policy().max_capacity(),
            PickleOptions::MAX_CAPACITY
        );
    }
}
