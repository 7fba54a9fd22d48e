use std::ops::Range;

use pickle_common::{Result, error::Error};

use crate::align::{align_down, checked_align_up};

/// Capacity growth rules for a [`PickleBuffer`].
///
/// Capacity is always handed out in whole allocation units. When the buffer
/// runs out of room, the new capacity is the larger of twice the current
/// capacity and the required size, rounded up to the allocation unit and
/// clamped to `max_capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPolicy {
    allocation_unit: usize,
    max_capacity: usize,
}

impl GrowthPolicy {
    /// Default allocation unit in bytes.
    pub const DEFAULT_ALLOCATION_UNIT: usize = 64;

    /// Creates a new growth policy.
    ///
    /// # Panics
    ///
    /// Panics if `allocation_unit` is not a non-zero power of two.
    pub fn new(allocation_unit: usize, max_capacity: usize) -> GrowthPolicy {
        assert!(allocation_unit.is_power_of_two());
        GrowthPolicy {
            allocation_unit,
            max_capacity,
        }
    }

    /// Allocation unit, in bytes.
    #[inline]
    pub fn allocation_unit(&self) -> usize {
        self.allocation_unit
    }

    /// Largest capacity the buffer is allowed to reach, in bytes.
    #[inline]
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Computes the capacity to grow to from `current` so that at least
    /// `required` bytes fit.
    ///
    /// Returns `None` when `required` exceeds the maximum capacity.
    ///
    /// ```
    /// use pickle_bytes::buffer::GrowthPolicy;
    ///
    /// let policy = GrowthPolicy::new(64, 1 << 20);
    /// assert_eq!(policy.next_capacity(0, 4), Some(64));
    /// assert_eq!(policy.next_capacity(64, 65), Some(128));
    /// assert_eq!(policy.next_capacity(128, 1000), Some(1024));
    /// assert_eq!(policy.next_capacity(0, (1 << 20) + 1), None);
    /// ```
    pub fn next_capacity(&self, current: usize, required: usize) -> Option<usize> {
        if required > self.max_capacity {
            return None;
        }
        let target = current.saturating_mul(2).max(required);
        let rounded = checked_align_up(target, self.allocation_unit)
            .unwrap_or(align_down(usize::MAX, self.allocation_unit));
        Some(rounded.min(self.max_capacity).max(required))
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        GrowthPolicy::new(Self::DEFAULT_ALLOCATION_UNIT, isize::MAX as usize)
    }
}

/// A growable byte buffer with an explicit, fallible growth policy.
///
/// Unlike a plain `Vec<u8>`, the capacity of a `PickleBuffer` is tracked
/// explicitly and only changes through [`GrowthPolicy::next_capacity`].
/// Every growth step is fallible: when the allocation cannot be satisfied,
/// the operation returns [`AllocationFailure`](pickle_common::error::ErrorKind::AllocationFailure)
/// and the buffer contents are left untouched.
pub struct PickleBuffer {
    /// Bytes in use; `inner.len()` is the logical length.
    inner: Vec<u8>,
    /// Tracked capacity, a multiple of the allocation unit (or `max_capacity`).
    capacity: usize,
    policy: GrowthPolicy,
}

impl PickleBuffer {
    /// Creates a new empty buffer with no allocation.
    pub fn new() -> PickleBuffer {
        Self::with_policy(GrowthPolicy::default())
    }

    /// Creates a new empty buffer governed by the given policy, without allocating.
    pub fn with_policy(policy: GrowthPolicy) -> PickleBuffer {
        PickleBuffer {
            inner: Vec::new(),
            capacity: 0,
            policy,
        }
    }

    /// Creates a new empty buffer able to hold at least `capacity` bytes.
    /// Requests above the policy's maximum are clamped to it.
    ///
    /// Like `Vec::with_capacity`, this aborts if the allocator cannot satisfy
    /// the request; use [`try_with_capacity`](Self::try_with_capacity) to
    /// handle allocation failure.
    pub fn with_capacity(capacity: usize, policy: GrowthPolicy) -> PickleBuffer {
        let capacity = policy
            .next_capacity(0, capacity)
            .unwrap_or(policy.max_capacity());
        PickleBuffer {
            inner: Vec::with_capacity(capacity),
            capacity,
            policy,
        }
    }

    /// Creates a buffer of `len` zero bytes with room for at least `capacity` bytes.
    pub fn zeroed(len: usize, capacity: usize, policy: GrowthPolicy) -> PickleBuffer {
        let mut buf = Self::with_capacity(capacity.max(len), policy);
        debug_assert!(len <= buf.capacity);
        buf.inner.resize(len, 0);
        buf
    }

    /// Creates a new empty buffer able to hold at least `capacity` bytes,
    /// reporting allocation failure instead of aborting.
    pub fn try_with_capacity(capacity: usize, policy: GrowthPolicy) -> Result<PickleBuffer> {
        let mut buf = Self::with_policy(policy);
        buf.try_reserve(capacity)?;
        Ok(buf)
    }

    /// Creates a new buffer containing a copy of the provided slice.
    pub fn copy_from_slice(data: &[u8]) -> PickleBuffer {
        Self::copy_with_policy(data, GrowthPolicy::default())
    }

    /// Returns the number of bytes in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the buffer contains no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of bytes the buffer can hold without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Growth policy of this buffer.
    #[inline]
    pub fn policy(&self) -> &GrowthPolicy {
        &self.policy
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.inner
    }

    /// Ensures room for at least `additional` more bytes.
    #[inline]
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let required = self
            .len()
            .checked_add(additional)
            .ok_or_else(|| Error::allocation_failure(usize::MAX))?;
        if required <= self.capacity {
            return Ok(());
        }
        self.grow(required)
    }

    /// Appends `additional` zero bytes and returns the range they occupy.
    pub fn try_extend_zeroed(&mut self, additional: usize) -> Result<Range<usize>> {
        self.try_reserve(additional)?;
        let start = self.len();
        self.inner.resize(start + additional, 0);
        Ok(start..start + additional)
    }

    /// Appends a copy of `data`.
    pub fn try_extend_from_slice(&mut self, data: &[u8]) -> Result<()> {
        self.try_reserve(data.len())?;
        self.inner.extend_from_slice(data);
        Ok(())
    }

    /// Shortens the buffer to `new_len` bytes; capacity is retained.
    pub fn truncate(&mut self, new_len: usize) {
        self.inner.truncate(new_len);
    }

    /// Removes all bytes; capacity is retained.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Consumes the buffer, returning the bytes in use.
    pub fn into_vec(self) -> Vec<u8> {
        self.inner
    }
}

impl PickleBuffer {
    fn copy_with_policy(data: &[u8], policy: GrowthPolicy) -> PickleBuffer {
        let mut buf = Self::with_capacity(data.len(), policy);
        buf.inner.extend_from_slice(data);
        buf
    }

    /// Grows the capacity so that at least `required` bytes fit.
    #[cold]
    fn grow(&mut self, required: usize) -> Result<()> {
        let Some(new_cap) = self.policy.next_capacity(self.capacity, required) else {
            log::warn!(
                "pickle buffer growth to {required} bytes exceeds the limit of {} bytes",
                self.policy.max_capacity
            );
            return Err(Error::allocation_failure(required));
        };
        if let Err(e) = self.inner.try_reserve_exact(new_cap - self.inner.len()) {
            log::warn!("pickle buffer allocation of {new_cap} bytes failed: {e}");
            return Err(Error::allocation_failure(new_cap));
        }
        log::trace!(
            "pickle buffer grown from {} to {new_cap} bytes",
            self.capacity
        );
        self.capacity = new_cap;
        Ok(())
    }
}

impl std::ops::Deref for PickleBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl std::ops::DerefMut for PickleBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl Clone for PickleBuffer {
    fn clone(&self) -> PickleBuffer {
        Self::copy_with_policy(self.as_slice(), self.policy)
    }
}

impl std::fmt::Debug for PickleBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickleBuffer")
            .field("values", &self.as_slice())
            .field("len", &self.len())
            .field("cap", &self.capacity())
            .field("internal_cap", &self.inner.capacity())
            .finish_non_exhaustive()
    }
}

impl Default for PickleBuffer {
    fn default() -> Self {
        Self::new()
    }
}
