//! Helpers to assert invariants of our code.

/// Infallible numeric conversions that `From` does not provide.
///
/// The crate denies `as` conversions, every cast that is known to be lossless
/// on supported platforms lives here instead.
pub(crate) trait CastFrom<T> {
    fn cast_from(from: T) -> Self;
}

#[allow(clippy::as_conversions)]
mod cast_impls {
    use super::CastFrom;

    // We only support platforms where `usize` is at most 64 bits wide.
    static_assertions::const_assert!(core::mem::size_of::<usize>() <= 8);

    impl CastFrom<usize> for u64 {
        #[inline(always)]
        fn cast_from(from: usize) -> u64 {
            from as u64
        }
    }

    impl CastFrom<u8> for usize {
        #[inline(always)]
        fn cast_from(from: u8) -> usize {
            usize::from(from)
        }
    }

    impl CastFrom<u32> for usize {
        #[inline(always)]
        fn cast_from(from: u32) -> usize {
            from as usize
        }
    }
}

#[inline(always)]
#[cold]
fn cold_path() {}

/// "Annotation" to hint that a branch of an if-statement is likely to occur.
#[inline(always)]
pub(crate) fn likely(b: bool) -> bool {
    if b {
        true
    } else {
        cold_path();
        false
    }
}

/// "Annotation" to hint that a branch of an if-statement is _not likely_ to occur.
#[inline(always)]
pub(crate) fn unlikely(b: bool) -> bool {
    if b {
        cold_path();
        true
    } else {
        false
    }
}
