use std::{
    future::Future,
    pin::Pin,
    task::{self, Poll},
};

use pin_project::pin_project;

use crate::AsyncResumableFilter;

pub trait AsyncIterator {
    type Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Option<Self::Item>>;

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }

    #[inline]
    fn poll_next_unpin(&mut self, cx: &mut task::Context<'_>) -> Poll<Option<Self::Item>>
    where
        Self: Unpin,
    {
        Pin::new(self).poll_next(cx)
    }
}

pub trait AsyncIteratorExt: AsyncIterator {
    fn next(&mut self) -> Next<'_, Self>
    where
        Self: Unpin;

    fn for_each<F>(self, f: F) -> ForEach<Self, F>
    where
        Self: Sized,
        F: FnMut(Self::Item);

    fn resumable(self) -> AsyncResumableFilter<Self>
    where
        Self: Sized;
}

impl<I> AsyncIteratorExt for I
where
    I: AsyncIterator,
{
    fn next(&mut self) -> Next<'_, Self>
    where
        Self: Unpin,
    {
        Next(self)
    }

    fn for_each<F>(self, f: F) -> ForEach<Self, F>
    where
        Self: Sized,
        F: FnMut(Self::Item),
    {
        ForEach {
            async_iter: self,
            f,
        }
    }

    fn resumable(self) -> AsyncResumableFilter<Self>
    where
        Self: Sized,
    {
        AsyncResumableFilter::new(self)
    }
}

#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct Next<'a, T: ?Sized>(&'a mut T);

impl<T> Future for Next<'_, T>
where
    T: ?Sized + AsyncIterator + Unpin,
{
    type Output = Option<T::Item>;

    #[inline]
    fn poll(mut self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Self::Output> {
        self.0.poll_next_unpin(cx)
    }
}

#[derive(Debug)]
#[pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct ForEach<I, F> {
    #[pin]
    async_iter: I,
    f: F,
}

impl<I, F> Future for ForEach<I, F>
where
    I: AsyncIterator,
    F: FnMut(I::Item),
{
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();
        while let Some(element) = task::ready!(this.async_iter.as_mut().poll_next(cx)) {
            (this.f)(element);
        }

        Poll::Ready(())
    }
}

/// An [`AsyncIterator`] that is always ready, backed by a synchronous iterator.
#[derive(Debug, Clone)]
#[pin_project]
#[must_use]
pub struct Iter<I> {
    iter: I,
}

pub fn iter<I>(iter: I) -> Iter<I::IntoIter>
where
    I: IntoIterator,
{
    Iter {
        iter: iter.into_iter(),
    }
}

impl<I> AsyncIterator for Iter<I>
where
    I: Iterator,
{
    type Item = I::Item;

    #[inline]
    fn poll_next(self: Pin<&mut Self>, _cx: &mut task::Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.project().iter.next())
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}
