//! Asynchronous verification of claiming transactions.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context as TaskContext, Poll},
    time::Duration,
};

use futures::FutureExt;
use tower::{timeout::Timeout, Service, ServiceExt};
use tracing::Instrument;

use pegin_chain::{
    block,
    transaction::{self, Transaction},
    FeeRate,
};
use pegin_state as ps;

use crate::{
    error::{ProofError, TransactionError},
    pegin::{check, claim, Context, PeginSummary},
    BoxError, Config,
};


/// A timeout applied to parent chain lookups.
///
/// Lookups that time out fail the proof, so a stalled parent chain view
/// can't hold up mempool admission or block connection.
pub const PARENT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(60);

/// Asynchronous claiming transaction verification.
///
/// Mempool admission and block connection both use this service, so they
/// always agree on a transaction's verdict at the same height.
#[derive(Debug, Clone)]
pub struct Verifier<ZS> {
    config: Arc<Config>,
    state: Timeout<ZS>,
}

impl<ZS> Verifier<ZS>
where
    ZS: Service<ps::Request, Response = ps::Response, Error = BoxError> + Send + Clone + 'static,
    ZS::Future: Send + 'static,
{
    /// Create a new transaction verifier, which reads the parent chain from `state`.
    pub fn new(config: Arc<Config>, state: ZS) -> Self {
        Self {
            config,
            state: Timeout::new(state, PARENT_LOOKUP_TIMEOUT),
        }
    }
}

/// Specifies whether a transaction should be verified as part of a block or
/// as part of the mempool.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    /// Verify the supplied transaction as part of a block.
    Block {
        /// The transaction itself.
        transaction: Arc<Transaction>,
        /// The height of the block containing this transaction.
        height: block::Height,
    },

    /// Verify the supplied transaction as part of the mempool.
    Mempool {
        /// The transaction itself.
        transaction: Arc<Transaction>,
        /// The height of the current chain tip.
        tip_height: block::Height,
        /// The fee rate the submitter declared for pricing the subsidy of
        /// unvalidated peg-ins.
        declared_feerate: Option<FeeRate>,
    },
}

impl Request {
    /// The transaction to verify.
    pub fn transaction(&self) -> Arc<Transaction> {
        match self {
            Request::Block { transaction, .. } | Request::Mempool { transaction, .. } => {
                transaction.clone()
            }
        }
    }

    /// The height the peg-in rules are checked at.
    pub fn height(&self) -> block::Height {
        match self {
            Request::Block { height, .. } => *height,
            Request::Mempool { tip_height, .. } => *tip_height,
        }
    }

    /// The declared fee rate, which only mempool submissions can have.
    pub fn declared_feerate(&self) -> Option<FeeRate> {
        match self {
            Request::Block { .. } => None,
            Request::Mempool {
                declared_feerate, ..
            } => *declared_feerate,
        }
    }

    /// Returns true if the request is a mempool request.
    pub fn is_mempool(&self) -> bool {
        matches!(self, Request::Mempool { .. })
    }
}

/// The response to a successful verification.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Response {
    /// The verified transaction's hash.
    pub tx_hash: transaction::Hash,

    /// The transaction's peg-in facts.
    pub summary: PeginSummary,
}

impl<ZS> Service<Request> for Verifier<ZS>
where
    ZS: Service<ps::Request, Response = ps::Response, Error = BoxError> + Send + Clone + 'static,
    ZS::Future: Send + 'static,
{
    type Response = Response;
    type Error = TransactionError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let config = self.config.clone();
        let state = self.state.clone();

        let tx = req.transaction();
        let tx_hash = tx.hash();
        let span = tracing::debug_span!("tx", ?tx_hash);

        async move {
            tracing::trace!(?req, "got tx verify request");

            let claims = claim::collect(&tx, config.validate_pegin)?;
            metrics::counter!("pegin.claims.count").increment(claims.len() as u64);

            // All the lookups for this transaction are answered from one snapshot.
            let parent_data = match claims.first() {
                Some(first) if config.validate_pegin => Some(
                    Self::pegin_data(state, claim::lookups(&claims))
                        .await
                        .map_err(|source| TransactionError::Proof {
                            index: first.input_index,
                            source,
                        })?,
                ),
                _ => None,
            };
            tracing::trace!(claims = claims.len(), "got parent chain data");

            let context = Context {
                config: &config,
                height: req.height(),
                parent_data: parent_data.as_ref(),
                declared_feerate: req.declared_feerate(),
            };

            let claims = claim::aggregate(claims, &context)?;
            let summary = check::check_claims(&tx, &claims, &context)?;

            Ok::<_, TransactionError>(Response { tx_hash, summary })
        }
        .inspect(move |result| match result {
            Ok(response) => {
                metrics::counter!("pegin.verified.accepted").increment(1);
                tracing::trace!(summary = ?response.summary, "accepted claiming transaction");
            }
            Err(error) => {
                let reason = error.reject_reason();
                metrics::counter!("pegin.verified.rejected", "reason" => reason.as_str())
                    .increment(1);
                tracing::debug!(%reason, %error, "rejected claiming transaction");
            }
        })
        .instrument(span)
        .boxed()
    }
}

impl<ZS> Verifier<ZS>
where
    ZS: Service<ps::Request, Response = ps::Response, Error = BoxError> + Send + Clone + 'static,
    ZS::Future: Send + 'static,
{
    /// Fetches the parent chain data for all the claims of a transaction.
    ///
    /// Failed or timed out lookups are proof failures, and are not retried.
    async fn pegin_data(
        state: Timeout<ZS>,
        lookups: Vec<ps::ClaimLookup>,
    ) -> Result<ps::PeginData, ProofError> {
        let response = state
            .oneshot(ps::Request::PeginData(lookups))
            .await
            .map_err(|error| ProofError::Lookup(error.to_string()))?;

        match response {
            ps::Response::PeginData(data) => Ok(data),
            other => Err(ProofError::Lookup(format!(
                "unexpected parent chain response: {other:?}"
            ))),
        }
    }
}
