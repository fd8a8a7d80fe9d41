//! The parent chain writer, and the read-only [`tower::Service`] that
//! answers peg-in validation queries.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::FutureExt;
use tokio::sync::watch;
use tower::Service;
use tracing::instrument;

use pegin_chain::parent;

use crate::{BoxError, ParentChainSnapshot, Request, Response, StateError};

pub mod watch_receiver;

use watch_receiver::WatchReceiver;

/// Initializes an empty parent chain view, whose first block will be at
/// `start_height`.
///
/// Returns the single writer, and a read service that can be cloned freely.
pub fn init(start_height: u32) -> (ParentChainState, ReadStateService) {
    let snapshot = Arc::new(ParentChainSnapshot::new(start_height));
    let (sender, receiver) = watch::channel(snapshot.clone());

    let state = ParentChainState { snapshot, sender };
    let read_service = ReadStateService {
        snapshot: WatchReceiver::new(receiver),
    };

    (state, read_service)
}

/// The only writer of the parent chain view.
///
/// Each update builds a complete new snapshot, then publishes it. Readers
/// holding an older snapshot keep it until they drop it.
///
/// Copying a snapshot copies its block list and indexes, so each update
/// takes time proportional to the length of the chain. Transactions are
/// shared between copies.
#[derive(Debug)]
pub struct ParentChainState {
    /// The latest published snapshot.
    snapshot: Arc<ParentChainSnapshot>,

    sender: watch::Sender<Arc<ParentChainSnapshot>>,
}

impl ParentChainState {
    /// Appends a block to the parent chain, and publishes the new snapshot.
    ///
    /// The block must extend the current tip, and `transactions` must be
    /// all of its transactions, in block order.
    #[instrument(skip(self, header, transactions), fields(hash = %header.hash()))]
    pub fn commit_block(
        &mut self,
        header: parent::Header,
        transactions: Vec<Arc<parent::Transaction>>,
    ) -> Result<parent::BlockHash, StateError> {
        let mut next = ParentChainSnapshot::clone(&self.snapshot);
        let hash = next.push_block(header, &transactions)?;

        self.publish(next);

        Ok(hash)
    }

    /// Removes every block above `height`, and publishes the new snapshot.
    #[instrument(skip(self))]
    pub fn rollback_to(&mut self, height: u32) -> Result<(), StateError> {
        let mut next = ParentChainSnapshot::clone(&self.snapshot);
        next.rollback_to(height)?;

        self.publish(next);

        Ok(())
    }

    /// Returns the latest published snapshot.
    pub fn snapshot(&self) -> Arc<ParentChainSnapshot> {
        self.snapshot.clone()
    }

    fn publish(&mut self, next: ParentChainSnapshot) {
        let best_height = next.best_height();
        let next = Arc::new(next);

        self.snapshot = next.clone();
        // Stores the value even if every receiver has been dropped.
        self.sender.send_replace(next);

        if let Some(best_height) = best_height {
            metrics::gauge!("pegin.state.parent.tip.height").set(best_height as f64);
        }
        tracing::debug!(?best_height, "published parent chain snapshot");
    }
}

/// A read-only service for querying the parent chain view.
///
/// Each request is answered from the snapshot that was current when the
/// request was made.
#[derive(Clone, Debug)]
pub struct ReadStateService {
    snapshot: WatchReceiver<Arc<ParentChainSnapshot>>,
}

impl ReadStateService {
    /// Returns the current snapshot.
    pub fn latest(&self) -> Arc<ParentChainSnapshot> {
        self.snapshot.cloned_watch_data()
    }
}

impl Service<Request> for ReadStateService {
    type Response = Response;
    type Error = BoxError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    #[instrument(name = "read_state", skip(self, req))]
    fn call(&mut self, req: Request) -> Self::Future {
        let snapshot = self.latest();

        let response = match req {
            Request::Transaction(txid) => Response::Transaction(snapshot.transaction(txid)),
            Request::BlockHeader(hash) => Response::BlockHeader(snapshot.header(hash)),
            Request::BestHeight => Response::BestHeight(snapshot.best_height()),
            Request::PeginData(lookups) => {
                metrics::counter!("pegin.state.pegin_data.requests").increment(1);
                Response::PeginData(snapshot.pegin_data(&lookups))
            }
        };

        async move { Ok(response) }.boxed()
    }
}
