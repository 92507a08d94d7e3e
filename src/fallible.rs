//! Views driven by predicates that can fail.

use std::iter::FusedIterator;

use tracing::{event, Level};

use crate::resumable_filter::{ResumableFilter, Step};

impl<I: Iterator> ResumableFilter<I> {
    /// Like [`apply`](Self::apply), but with a predicate that may fail.
    ///
    /// A predicate error is yielded as is and ends the view. If the failing element was the pending
    /// one it stays pending, so a later call can examine it again. An element freshly pulled from
    /// the source is dropped on failure and cannot be replayed.
    pub fn try_apply<P, E>(&mut self, predicate: P) -> TryApply<'_, I, P>
    where
        P: FnMut(&I::Item) -> Result<bool, E>,
    {
        if self.exhausted {
            event!(Level::TRACE, "try_apply on exhausted source");
        }

        TryApply {
            finished: self.exhausted,
            filter: self,
            predicate,
        }
    }
}

/// View returned by [`ResumableFilter::try_apply`].
#[must_use = "views are lazy and do nothing unless iterated"]
pub struct TryApply<'a, I: Iterator, P> {
    filter: &'a mut ResumableFilter<I>,
    predicate: P,
    finished: bool,
}

impl<I, P, E> Iterator for TryApply<'_, I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> Result<bool, E>,
{
    type Item = Result<I::Item, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.filter.step(&mut self.predicate) {
            Ok(Step::Yield(item)) => Some(Ok(item)),
            Ok(Step::Cutover | Step::End) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                event!(Level::DEBUG, "predicate failed");
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, self.filter.remaining_upper_bound())
        }
    }
}

impl<I, P, E> FusedIterator for TryApply<'_, I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> Result<bool, E>,
{
}
