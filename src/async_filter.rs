use std::{
    fmt,
    pin::Pin,
    task::{self, Poll},
};

use pin_project::pin_project;
use tracing::{event, Level};

use crate::{AsyncIterator, State};

/// The [`ResumableFilter`](crate::ResumableFilter) state machine over an [`AsyncIterator`] source.
///
/// A source returning `Poll::Pending` suspends the current view without touching the pending slot
/// or the exhausted flag; the same pull is resumed on the next poll.
#[pin_project]
pub struct AsyncResumableFilter<S: AsyncIterator> {
    #[pin]
    source: S,
    pending: Option<S::Item>,
    exhausted: bool,
}

impl<S: AsyncIterator> AsyncResumableFilter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            pending: None,
            exhausted: false,
        }
    }

    /// Returns a lazy view yielding elements while `predicate` holds.
    ///
    /// See [`ResumableFilter::apply`](crate::ResumableFilter::apply); the semantics are the same.
    pub fn apply<P>(self: Pin<&mut Self>, predicate: P) -> AsyncApply<'_, S, P>
    where
        P: FnMut(&S::Item) -> bool,
    {
        let finished = self.exhausted;
        if finished {
            event!(Level::TRACE, "apply on exhausted source");
        }

        AsyncApply {
            filter: self,
            predicate,
            yielded: 0,
            finished,
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

    #[must_use]
    pub fn pending(&self) -> Option<&S::Item> {
        self.pending.as_ref()
    }
}

impl<S> fmt::Debug for AsyncResumableFilter<S>
where
    S: AsyncIterator + fmt::Debug,
    S::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResumableFilter")
            .field("source", &self.source)
            .field("pending", &self.pending)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

/// View returned by [`AsyncResumableFilter::apply`].
#[pin_project]
#[must_use = "views are lazy and do nothing unless polled"]
pub struct AsyncApply<'a, S: AsyncIterator, P> {
    filter: Pin<&'a mut AsyncResumableFilter<S>>,
    predicate: P,
    yielded: usize,
    finished: bool,
}

impl<S, P> AsyncIterator for AsyncApply<'_, S, P>
where
    S: AsyncIterator,
    P: FnMut(&S::Item) -> bool,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.finished {
            return Poll::Ready(None);
        }

        let filter = this.filter.as_mut().project();
        if let Some(pending) = filter.pending.as_ref() {
            if (this.predicate)(pending) {
                *this.yielded += 1;
                return Poll::Ready(filter.pending.take());
            }

            *this.finished = true;
            event!(Level::TRACE, yielded = *this.yielded, "cutover");
            return Poll::Ready(None);
        }

        if *filter.exhausted {
            *this.finished = true;
            return Poll::Ready(None);
        }

        let Some(candidate) = task::ready!(filter.source.poll_next(cx)) else {
            *filter.exhausted = true;
            *this.finished = true;
            event!(Level::TRACE, "source exhausted");
            return Poll::Ready(None);
        };

        if (this.predicate)(&candidate) {
            *this.yielded += 1;
            Poll::Ready(Some(candidate))
        } else {
            *filter.pending = Some(candidate);
            *this.finished = true;
            event!(Level::TRACE, yielded = *this.yielded, "cutover");
            Poll::Ready(None)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished || self.filter.exhausted {
            return (0, Some(0));
        }

        let (_, upper) = self.filter.source.size_hint();
        let pending = usize::from(self.filter.pending.is_some());
        (0, upper.and_then(|n| n.checked_add(pending)))
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, pin::pin, time::Duration};

    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::{
        async_iterator::{iter, tests::DelayedSource},
        AsyncIterator, AsyncIteratorExt, State,
    };

    async fn drain<I>(mut view: I) -> Vec<I::Item>
    where
        I: AsyncIterator + Unpin,
    {
        let mut out = Vec::new();
        while let Some(item) = view.next().await {
            out.push(item);
        }
        out
    }

    fn delayed<I: Iterator + Unpin>(iter: I) -> DelayedSource<I> {
        DelayedSource::new(iter, 3, Duration::from_millis(0)..Duration::from_millis(5))
    }

    #[tokio::test]
    async fn worked_scenario() {
        let key = |k: u32| BTreeSet::from([k]);
        let data = [0, 1, 1, 2, 3, 4].map(key);
        let mut filter = pin!(delayed(data.into_iter()).resumable());

        let mut groups = Vec::new();
        for y in 0..6 {
            let bound = key(y);
            groups.push(drain(filter.as_mut().apply(|k| k.is_subset(&bound))).await);
        }

        assert_eq!(
            groups,
            [
                vec![key(0)],
                vec![key(1), key(1)],
                vec![key(2)],
                vec![key(3)],
                vec![key(4)],
                vec![],
            ]
        );
        assert_eq!(filter.state(), State::Exhausted);
    }

    #[tokio::test]
    async fn empty_source() {
        let mut filter = pin!(iter(Vec::<u8>::new()).resumable());
        assert_eq!(filter.state(), State::Active);

        assert!(drain(filter.as_mut().apply(|_| true)).await.is_empty());
        assert!(filter.is_exhausted());
        assert!(filter.pending().is_none());
    }

    #[tokio::test]
    async fn exhausted_filter_is_inert() {
        let mut filter = pin!(delayed(0..3).resumable());
        assert_eq!(drain(filter.as_mut().apply(|_| true)).await, [0, 1, 2]);

        for _ in 0..3 {
            let view = filter
                .as_mut()
                .apply(|_: &i32| panic!("predicate invoked after exhaustion"));
            assert_eq!(view.size_hint(), (0, Some(0)));
            assert!(drain(view).await.is_empty());
        }
    }

    #[tokio::test]
    async fn boundary_element_moves_to_next_view() {
        let mut filter = pin!(iter([0, 0, 1, 5]).resumable());

        assert!(drain(filter.as_mut().apply(|n| *n > 0)).await.is_empty());
        assert_eq!(filter.pending(), Some(&0));
        assert_eq!(filter.state(), State::Active);

        let mut view = filter.as_mut().apply(|n| *n < 5);
        assert_eq!(view.size_hint(), (0, Some(4)));
        assert_eq!(view.next().await, Some(0));
        assert_eq!(view.next().await, Some(0));
        assert_eq!(view.next().await, Some(1));
        assert_eq!(view.next().await, None);
        assert_eq!(view.next().await, None);

        assert_eq!(filter.pending(), Some(&5));
        assert_eq!(drain(filter.as_mut().apply(|_| true)).await, [5]);
    }

    #[tokio::test]
    async fn random_partitions() {
        let mut rng = StdRng::seed_from_u64(0xf17e);

        for _ in 0..25 {
            let len = rng.gen_range(0..20);
            let mut data: Vec<u32> = (0..len).map(|_| rng.gen_range(0..10)).collect();
            data.sort_unstable();
            let mut bounds: Vec<u32> = (0..rng.gen_range(1..5))
                .map(|_| rng.gen_range(0..12))
                .collect();
            bounds.sort_unstable();

            let mut filter = pin!(delayed(data.clone().into_iter()).resumable());
            let mut seen = Vec::new();
            for bound in bounds {
                seen.extend(drain(filter.as_mut().apply(|n| *n <= bound)).await);
            }
            seen.extend(drain(filter.as_mut().apply(|_| true)).await);

            assert_eq!(seen, data);
            assert!(filter.is_exhausted());
        }
    }
}
