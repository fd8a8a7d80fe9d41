//! A [`tokio::sync::watch`] channel wrapper for snapshot readers.

use tokio::sync::watch;

/// Access to the latest value in a [`watch::Receiver`], without holding the
/// channel's read lock.
///
/// Cloned instances see the same values.
///
/// If the writer publishes several values quickly, readers can skip some of
/// them. Each read still sees a complete value.
#[derive(Clone, Debug)]
pub struct WatchReceiver<T> {
    receiver: watch::Receiver<T>,
}

impl<T> WatchReceiver<T> {
    /// Wraps a watch channel receiver.
    pub fn new(receiver: watch::Receiver<T>) -> Self {
        Self { receiver }
    }
}

impl<T> WatchReceiver<T>
where
    T: Clone,
{
    /// Applies `f` to a clone of the current value.
    ///
    /// The read lock is released before `f` runs, so `f` can't block the writer.
    /// Does not mark the value as seen.
    pub fn with_watch_data<U, F>(&self, f: F) -> U
    where
        F: FnOnce(T) -> U,
    {
        let cloned_data = self.cloned_watch_data();

        f(cloned_data)
    }

    /// Returns a clone of the current value.
    ///
    /// Does not mark the value as seen.
    ///
    /// # Correctness
    ///
    /// `receiver.borrow()` must not be called twice in the same scope. If the
    /// writer starts a send between the two borrows, the second borrow waits
    /// for the writer, and the writer waits for the first borrow.
    pub fn cloned_watch_data(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Waits until a new value is published, and marks it as seen.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.receiver.changed().await
    }

    /// Returns `true` if a value has been published since the last one seen.
    pub fn has_changed(&self) -> Result<bool, watch::error::RecvError> {
        self.receiver.has_changed()
    }

    /// Marks the current value as seen.
    pub fn mark_as_seen(&mut self) {
        self.receiver.borrow_and_update();
    }
}
