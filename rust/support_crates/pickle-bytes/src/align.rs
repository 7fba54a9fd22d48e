/// Aligns a number up to the next multiple of the specified alignment.
///
/// This function rounds up the input number to the nearest multiple of the alignment
/// that is greater than or equal to the input. If the input is already aligned,
/// it returns the input unchanged.
///
/// # Arguments
///
/// * `n` - The number to align up
/// * `alignment` - The alignment boundary (must be a power of 2 and non-zero)
///
/// # Examples
///
/// ```
/// use pickle_bytes::align::align_up;
///
/// assert_eq!(align_up(0, 4), 0);
/// assert_eq!(align_up(1, 4), 4);
/// assert_eq!(align_up(3, 4), 4);
/// assert_eq!(align_up(4, 4), 4);
/// assert_eq!(align_up(5, 4), 8);
/// ```
///
/// # Panics
///
/// Panics in debug builds if `alignment` is not a non-zero power of 2, and on
/// arithmetic overflow. Use [`checked_align_up`] for lengths that come from
/// untrusted input.
#[inline]
pub fn align_up(n: usize, alignment: usize) -> usize {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n + alignment - 1) & !(alignment - 1)
}

/// Same as [`align_up`], but returns `None` instead of overflowing.
///
/// ```
/// use pickle_bytes::align::checked_align_up;
///
/// assert_eq!(checked_align_up(5, 4), Some(8));
/// assert_eq!(checked_align_up(usize::MAX, 4), None);
/// ```
#[inline]
pub fn checked_align_up(n: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    Some(n.checked_add(alignment - 1)? & !(alignment - 1))
}

/// Aligns a number down to the previous multiple of the specified alignment.
///
/// ```
/// use pickle_bytes::align::align_down;
///
/// assert_eq!(align_down(7, 4), 4);
/// assert_eq!(align_down(8, 4), 8);
/// ```
#[inline]
pub fn align_down(n: usize, alignment: usize) -> usize {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    n & !(alignment - 1)
}

/// Checks if a number is aligned to the specified alignment boundary.
///
/// ```
/// use pickle_bytes::align::is_aligned;
///
/// assert!(is_aligned(0, 4));
/// assert!(!is_aligned(6, 4));
/// assert!(is_aligned(12, 4));
/// ```
#[inline]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}

/// Number of padding bytes needed after `n` bytes to reach the next
/// `alignment` boundary.
///
/// ```
/// use pickle_bytes::align::padding_len;
///
/// assert_eq!(padding_len(0, 4), 0);
/// assert_eq!(padding_len(1, 4), 3);
/// assert_eq!(padding_len(6, 4), 2);
/// ```
#[inline]
pub fn padding_len(n: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    n.wrapping_neg() & (alignment - 1)
}
