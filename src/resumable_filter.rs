use std::{convert::Infallible, fmt, iter::FusedIterator};

use tracing::{event, Level};

use crate::State;

/// Applies a succession of predicates to one single pass over a source iterator.
///
/// Every call to [`apply`](Self::apply) returns a view that yields source elements while the
/// predicate holds. The first element that fails the predicate is not lost: it is kept as the
/// *pending* element and offered first to the predicate of the next call. Once the source runs
/// dry the filter is [`State::Exhausted`] for good, and any further view is empty.
///
/// At most one element is buffered at any time.
pub struct ResumableFilter<I: Iterator> {
    pub(crate) source: I,
    pub(crate) pending: Option<I::Item>,
    pub(crate) exhausted: bool,
}

/// Outcome of offering one candidate to a predicate.
pub(crate) enum Step<T> {
    Yield(T),
    Cutover,
    End,
}

impl<I: Iterator> ResumableFilter<I> {
    /// Wraps `source` without pulling anything from it.
    pub fn new<S>(source: S) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        Self {
            source: source.into_iter(),
            pending: None,
            exhausted: false,
        }
    }

    /// Returns a lazy view yielding elements while `predicate` holds.
    ///
    /// The element rejected by `predicate` is kept and re-examined by the predicate of the next
    /// call, so consecutive calls partition the source in order. Once the source is exhausted the
    /// returned view is empty and `predicate` is never invoked.
    ///
    /// If `predicate` panics on the pending element, that element stays pending. If it panics on
    /// an element freshly pulled from the source, the element is lost.
    pub fn apply<P>(&mut self, predicate: P) -> Apply<'_, I, P>
    where
        P: FnMut(&I::Item) -> bool,
    {
        if self.exhausted {
            event!(Level::TRACE, "apply on exhausted source");
        }

        Apply {
            finished: self.exhausted,
            filter: self,
            predicate,
            yielded: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> State {
        if self.exhausted {
            State::Exhausted
        } else {
            State::Active
        }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// The boundary element rejected by the last predicate, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&I::Item> {
        self.pending.as_ref()
    }

    /// Gives up filtering and returns every element not yielded so far, pending element first.
    pub fn into_remaining(self) -> Remaining<I> {
        Remaining {
            pending: self.pending,
            source: (!self.exhausted).then_some(self.source),
        }
    }

    fn pull(&mut self) -> Option<I::Item> {
        if self.exhausted {
            return None;
        }

        let item = self.source.next();
        if item.is_none() {
            self.exhausted = true;
            event!(Level::TRACE, "source exhausted");
        }
        item
    }

    /// Offers the next candidate to `classify`, calling it exactly once unless the source is
    /// exhausted.
    ///
    /// The pending element is only taken out of its slot once it has been accepted.
    pub(crate) fn step<E>(
        &mut self,
        classify: impl FnOnce(&I::Item) -> Result<bool, E>,
    ) -> Result<Step<I::Item>, E> {
        if let Some(pending) = &self.pending {
            if !classify(pending)? {
                return Ok(Step::Cutover);
            }
            return Ok(self.pending.take().map_or(Step::End, Step::Yield));
        }

        let Some(candidate) = self.pull() else {
            return Ok(Step::End);
        };

        if classify(&candidate)? {
            Ok(Step::Yield(candidate))
        } else {
            self.pending = Some(candidate);
            Ok(Step::Cutover)
        }
    }

    pub(crate) fn remaining_upper_bound(&self) -> Option<usize> {
        if self.exhausted {
            return Some(0);
        }

        let (_, upper) = self.source.size_hint();
        upper.and_then(|n| n.checked_add(usize::from(self.pending.is_some())))
    }
}

impl<I> fmt::Debug for ResumableFilter<I>
where
    I: Iterator + fmt::Debug,
    I::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumableFilter")
            .field("source", &self.source)
            .field("pending", &self.pending)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

/// View returned by [`ResumableFilter::apply`].
#[must_use = "views are lazy and do nothing unless iterated"]
pub struct Apply<'a, I: Iterator, P> {
    filter: &'a mut ResumableFilter<I>,
    predicate: P,
    yielded: usize,
    finished: bool,
}

impl<I, P> Iterator for Apply<'_, I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let predicate = &mut self.predicate;
        let step = match self
            .filter
            .step(|item| Ok::<_, Infallible>(predicate(item)))
        {
            Ok(step) => step,
            Err(never) => match never {},
        };

        match step {
            Step::Yield(item) => {
                self.yielded += 1;
                Some(item)
            }
            Step::Cutover => {
                self.finished = true;
                event!(Level::TRACE, yielded = self.yielded, "cutover");
                None
            }
            Step::End => {
                self.finished = true;
                None
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

impl<I, P> FusedIterator for Apply<'_, I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
}

/// Iterator over the elements a [`ResumableFilter`] has not yielded yet.
pub struct Remaining<I: Iterator> {
    pending: Option<I::Item>,
    source: Option<I>,
}

impl<I: Iterator> Iterator for Remaining<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.pending
            .take()
            .or_else(|| self.source.as_mut().and_then(Iterator::next))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let pending = usize::from(self.pending.is_some());
        let (lower, upper) = self
            .source
            .as_ref()
            .map_or((0, Some(0)), Iterator::size_hint);

        (
            lower.saturating_add(pending),
            upper.and_then(|n| n.checked_add(pending)),
        )
    }
}
