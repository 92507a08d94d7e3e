//! Partition an ordered stream into contiguous groups with a single pass.
//!
//! A [`ResumableFilter`] wraps one forward-only iterator and lets the caller apply a succession of
//! increasingly permissive predicates to it. Each call yields elements while its predicate holds;
//! the element that breaks the run is remembered and offered to the next predicate first. Every
//! source element is therefore consumed exactly once overall, without re-scanning and without
//! collecting the source.
//!
//! The input has to be ordered consistently with the predicates; this is not checked.
//!
//! ```
//! use std::collections::BTreeSet;
//!
//! use resumable_filter::ResumableFilterExt;
//!
//! let data = [0, 1, 1, 2, 3, 4].map(|k| BTreeSet::from([k]));
//! let mut filter = data.into_iter().resumable();
//!
//! let mut groups = Vec::new();
//! for y in 0..6 {
//!     let bound = BTreeSet::from([y]);
//!     let group: Vec<_> = filter.apply(|key| key.is_subset(&bound)).collect();
//!     groups.push(group.len());
//! }
//!
//! assert_eq!(groups, [1, 2, 1, 1, 1, 0]);
//! assert!(filter.is_exhausted());
//! ```

#[cfg(feature = "async")]
pub mod async_filter;
#[cfg(feature = "async")]
pub mod async_iterator;
pub mod fallible;
pub mod resumable_filter;

#[cfg(feature = "async")]
pub use async_filter::{AsyncApply, AsyncResumableFilter};
#[cfg(feature = "async")]
pub use async_iterator::{AsyncIterator, AsyncIteratorExt};
pub use fallible::TryApply;
pub use resumable_filter::{Apply, Remaining, ResumableFilter};

/// Lifecycle of a resumable filter.
///
/// `Exhausted` is terminal and is only reached when the source signals its end, never because a
/// predicate rejected an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Active,
    Exhausted,
}

pub trait ResumableFilterExt: IntoIterator {
    fn resumable(self) -> ResumableFilter<Self::IntoIter>
    where
        Self: Sized;
}

impl<I> ResumableFilterExt for I
where
    I: IntoIterator,
{
    fn resumable(self) -> ResumableFilter<Self::IntoIter>
    where
        Self: Sized,
    {
        ResumableFilter::new(self)
    }
}
