//! `Channel[T]` (spec.md §3, §4.A): a bounded or unbounded FIFO queue with
//! suspend-on-full `Send` and suspend-on-empty `Receive`, plus a `Close`
//! that wakes every waiter with [`CoopError::Closed`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::error::CoopError;

struct Inner<T> {
    buffer: VecDeque<T>,
    capacity: Option<usize>,
    closed: bool,
    send_wakers: VecDeque<Waker>,
    recv_wakers: VecDeque<Waker>,
}

/// Shared, cloneable FIFO channel. `capacity: None` means unbounded;
/// `Some(0)` is treated as `Some(1)` (a strict zero-capacity rendezvous
/// channel is not modeled — a minor simplification over the general async
/// mpsc idiom this is grounded on).
pub struct Channel<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Channel<T> {
    pub fn new(capacity: Option<usize>) -> Self {
        let capacity = capacity.map(|c| c.max(1));
        Self {
            inner: Rc::new(RefCell::new(Inner {
                buffer: VecDeque::new(),
                capacity,
                closed: false,
                send_wakers: VecDeque::new(),
                recv_wakers: VecDeque::new(),
            })),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().buffer.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Enqueue without suspending. Returns the value back if the channel is
    /// full or closed.
    pub fn send_nonblocking(&self, value: T) -> Result<(), T> {
        let mut inner = self.inner.borrow_mut();
        if inner.closed {
            return Err(value);
        }
        if let Some(cap) = inner.capacity {
            if inner.buffer.len() >= cap {
                return Err(value);
            }
        }
        inner.buffer.push_back(value);
        if let Some(waker) = inner.recv_wakers.pop_front() {
            waker.wake();
        }
        Ok(())
    }

    /// Dequeue without suspending. `None` if the channel is empty (whether
    /// or not it is closed).
    pub fn receive_nonblocking(&self) -> Option<T> {
        let mut inner = self.inner.borrow_mut();
        let value = inner.buffer.pop_front();
        if value.is_some() {
            if let Some(waker) = inner.send_wakers.pop_front() {
                waker.wake();
            }
        }
        value
    }

    /// Suspend until room is available, then enqueue. Resolves with
    /// `Err(Closed)` if the channel closes while suspended.
    pub fn send(&self, value: T) -> SendFuture<T> {
        SendFuture {
            channel: self.clone(),
            value: Some(value),
        }
    }

    /// Suspend until a value is available. Resolves with `Err(Closed)` only
    /// once the channel is both closed and drained.
    pub fn receive(&self) -> ReceiveFuture<T> {
        ReceiveFuture {
            channel: self.clone(),
        }
    }

    /// Mark closed and wake every waiter. Idempotent.
    pub fn close(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.closed {
            return;
        }
        inner.closed = true;
        for waker in inner.send_wakers.drain(..) {
            waker.wake();
        }
        for waker in inner.recv_wakers.drain(..) {
            waker.wake();
        }
    }
}

pub struct SendFuture<T> {
    channel: Channel<T>,
    value: Option<T>,
}

impl<T> Future for SendFuture<T> {
    type Output = Result<(), CoopError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut inner = this.channel.inner.borrow_mut();
        if inner.closed {
            return Poll::Ready(Err(CoopError::Closed));
        }
        let room = match inner.capacity {
            Some(cap) => inner.buffer.len() < cap,
            None => true,
        };
        if room {
            let value = this.value.take().expect("SendFuture polled after completion");
            inner.buffer.push_back(value);
            if let Some(waker) = inner.recv_wakers.pop_front() {
                waker.wake();
            }
            Poll::Ready(Ok(()))
        } else {
            inner.send_wakers.push_back(cx.waker().clone());
            Poll::Pending
        }
    }
}

pub struct ReceiveFuture<T> {
    channel: Channel<T>,
}

impl<T> Future for ReceiveFuture<T> {
    type Output = Result<T, CoopError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.channel.inner.borrow_mut();
        if let Some(value) = inner.buffer.pop_front() {
            if let Some(waker) = inner.send_wakers.pop_front() {
                waker.wake();
            }
            return Poll::Ready(Ok(value));
        }
        if inner.closed {
            return Poll::Ready(Err(CoopError::Closed));
        }
        inner.recv_wakers.push_back(cx.waker().clone());
        Poll::Pending
    }
}
