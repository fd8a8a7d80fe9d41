use std::sync::Arc;

use pegin_chain::parent;

use crate::KnownHeader;

/// The parent chain data for one [`ClaimLookup`](crate::ClaimLookup).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimData {
    /// The claim's proof block, if it is in the best chain.
    pub block: Option<KnownHeader>,

    /// The spent outputs, in lookup order, or `None` for each output that
    /// isn't in the best chain.
    pub prevouts: Vec<Option<parent::Output>>,
}

/// The parent chain data for all the claims in a transaction, read from one snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeginData {
    /// The best chain height when the data was read.
    pub best_height: Option<u32>,

    /// The data for each claim, in lookup order.
    pub claims: Vec<ClaimData>,
}

/// A response to a parent chain [`Request`](crate::Request).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Response {
    /// Response to [`Request::Transaction`](crate::Request::Transaction).
    Transaction(Option<Arc<parent::Transaction>>),

    /// Response to [`Request::BlockHeader`](crate::Request::BlockHeader).
    BlockHeader(Option<KnownHeader>),

    /// Response to [`Request::BestHeight`](crate::Request::BestHeight).
    BestHeight(Option<u32>),

    /// Response to [`Request::PeginData`](crate::Request::PeginData).
    PeginData(PeginData),
}
