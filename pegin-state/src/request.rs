use pegin_chain::parent;

/// Everything one peg-in claim needs from the parent chain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimLookup {
    /// The block the claim's inclusion proof commits to.
    pub block_hash: parent::BlockHash,

    /// The outputs spent by the claimed parent transaction, for computing its fee.
    pub prevouts: Vec<parent::OutPoint>,
}

/// A query about the parent chain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    /// Looks up a best chain transaction.
    ///
    /// Returns [`Response::Transaction`](crate::Response::Transaction).
    Transaction(parent::Txid),

    /// Looks up a best chain block header.
    ///
    /// Returns [`Response::BlockHeader`](crate::Response::BlockHeader).
    BlockHeader(parent::BlockHash),

    /// Returns the best chain height, as a [`Response::BestHeight`](crate::Response::BestHeight).
    BestHeight,

    /// Answers every lookup needed to verify the claims of one transaction,
    /// from the same snapshot.
    ///
    /// Returns [`Response::PeginData`](crate::Response::PeginData), with one
    /// [`ClaimData`](crate::ClaimData) per lookup, in order.
    PeginData(Vec<ClaimLookup>),
}
