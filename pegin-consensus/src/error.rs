//! Errors that can occur when checking peg-in rules.
//!
//! Each error variant corresponds to a peg-in rule, so enumerating all
//! possible verification failures enumerates the rules we implement, and
//! ensures that we don't reject transactions for a non-enumerated reason.

use std::fmt;

use thiserror::Error;

use pegin_chain::{
    amount::{self, Amount, NonNegative},
    parent,
    transaction::PeginWitnessError,
    FeeRate,
};

/// A stable identifier for why a transaction was rejected, reported to
/// mempool and block callers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RejectReason {
    /// `pegin-value-too-low`
    PeginValueTooLow,
    /// `pegin-subsidy-too-low`
    PeginSubsidyTooLow,
    /// `pegin-parent-feerate-too-low`
    PeginParentFeerateTooLow,
    /// `dust`
    Dust,
    /// `bad-pegin-witness`
    BadPeginWitness,
    /// `bad-pegin-proof`
    BadPeginProof,
    /// `pegin-output-not-found`
    PeginOutputNotFound,
}

impl RejectReason {
    /// Returns the reject reason string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::PeginValueTooLow => "pegin-value-too-low",
            RejectReason::PeginSubsidyTooLow => "pegin-subsidy-too-low",
            RejectReason::PeginParentFeerateTooLow => "pegin-parent-feerate-too-low",
            RejectReason::Dust => "dust",
            RejectReason::BadPeginWitness => "bad-pegin-witness",
            RejectReason::BadPeginProof => "bad-pegin-proof",
            RejectReason::PeginOutputNotFound => "pegin-output-not-found",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parent chain proof that didn't check out.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum ProofError {
    #[error("peg-in claims output {claimed}, but the witness has parent transaction {actual}")]
    WrongTransaction {
        claimed: parent::OutPoint,
        actual: parent::Txid,
    },

    #[error("peg-in inclusion proof is invalid: {0}")]
    Merkle(#[from] parent::MerkleError),

    #[error("peg-in inclusion proof does not include parent transaction {0}")]
    NotIncluded(parent::Txid),

    #[error("peg-in proof block {0} is not in the parent chain")]
    UnknownBlock(parent::BlockHash),

    #[error("peg-in proof block has {depth} confirmations, but {required} are required")]
    TooShallow { depth: u32, required: u32 },

    #[error("parent transaction spends {0}, which is not in the parent chain")]
    UnknownPrevout(parent::OutPoint),

    #[error("parent transaction fee is invalid: {0}")]
    Fee(amount::Error),

    #[error("parent chain lookup failed: {0}")]
    Lookup(String),

    #[error("parent transaction {0} has no claimed output paying the peg-in claim script")]
    OutputNotFound(parent::Txid),
}

/// The burn subsidy couldn't be computed.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum SubsidyError {
    #[error("a fee rate is needed to compute the subsidy of an unvalidated peg-in")]
    FeerateRequired,

    #[error("peg-in subsidy is out of range: {0}")]
    Amount(#[from] amount::Error),
}

/// A peg-in claim that isn't well formed.
#[derive(Error, Debug)]
pub enum MalformedClaim {
    #[error(transparent)]
    Witness(#[from] PeginWitnessError),

    #[error("peg-in witness has no parent transaction and inclusion proof")]
    MissingProof,

    #[error("parent output {0} is claimed more than once")]
    DuplicateOutpoint(parent::OutPoint),

    #[error("peg-in witness claims {claimed}, but the parent output holds {actual}")]
    ValueMismatch {
        claimed: Amount<NonNegative>,
        actual: Amount<NonNegative>,
    },

    #[error("total peg-in value is out of range: {0}")]
    TotalValue(amount::Error),
}

/// A deterministic peg-in policy or consensus rule failure.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum PeginError {
    #[error("parent transaction {txid} pays {feerate}, below the minimum of {min}")]
    ParentFeerateTooLow {
        txid: parent::Txid,
        feerate: FeeRate,
        min: FeeRate,
    },

    #[error(
        "peg-in value {} is below the minimum peg-in amount {}",
        .value.to_coin_string(),
        .min.to_coin_string()
    )]
    PeginValueTooLow {
        value: Amount<NonNegative>,
        min: Amount<NonNegative>,
    },

    #[error("output {index} is dust: {value} is below the threshold of {threshold}")]
    Dust {
        index: usize,
        value: Amount<NonNegative>,
        threshold: Amount<NonNegative>,
    },

    #[error("peg-in burn subsidy {burn:?} is below the required {required}")]
    SubsidyTooLow {
        burn: Option<Amount<NonNegative>>,
        required: Amount<NonNegative>,
    },
}

impl PeginError {
    /// Returns the stable reject reason for this rule.
    pub fn reject_reason(&self) -> RejectReason {
        match self {
            PeginError::ParentFeerateTooLow { .. } => RejectReason::PeginParentFeerateTooLow,
            PeginError::PeginValueTooLow { .. } => RejectReason::PeginValueTooLow,
            PeginError::Dust { .. } => RejectReason::Dust,
            PeginError::SubsidyTooLow { .. } => RejectReason::PeginSubsidyTooLow,
        }
    }
}

/// An error returned when verifying a claiming transaction.
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("input {index} has a malformed peg-in claim: {source}")]
    MalformedClaim {
        index: usize,
        #[source]
        source: MalformedClaim,
    },

    #[error("input {index} has an invalid peg-in proof: {source}")]
    Proof {
        index: usize,
        #[source]
        source: ProofError,
    },

    #[error(transparent)]
    Subsidy(#[from] SubsidyError),

    #[error(transparent)]
    Pegin(#[from] PeginError),
}

impl TransactionError {
    /// Returns the stable reject reason for this error.
    pub fn reject_reason(&self) -> RejectReason {
        match self {
            TransactionError::MalformedClaim { .. } => RejectReason::BadPeginWitness,
            TransactionError::Proof {
                source: ProofError::OutputNotFound(_),
                ..
            } => RejectReason::PeginOutputNotFound,
            TransactionError::Proof { .. } => RejectReason::BadPeginProof,
            // a subsidy that can't be computed can't be covered
            TransactionError::Subsidy(_) => RejectReason::PeginSubsidyTooLow,
            TransactionError::Pegin(error) => error.reject_reason(),
        }
    }
}

/// An error returned when building a claiming transaction.
///
/// Messages match the wallet's errors for the same failures.
#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("peg-in proof is invalid: {0}")]
    Proof(#[from] ProofError),

    #[error("peg-in claim is malformed: {0}")]
    MalformedClaim(#[from] MalformedClaim),

    #[error("Parent transaction must have a feerate of at least 1 sat/vb")]
    ParentFeerateTooLow { feerate: FeeRate },

    #[error(
        "Pegin amount ({}) is lower than the minimum pegin amount for this chain ({}).",
        .value.to_coin_string(),
        .min.to_coin_string()
    )]
    PeginValueTooLow {
        value: Amount<NonNegative>,
        min: Amount<NonNegative>,
    },

    #[error("Bitcoin transaction fee rate must be supplied, because validatepegin is off and this pegin requires a burn subsidy.")]
    FeerateRequired,

    #[error("Pegin transaction would create dust output. See the log for details.")]
    Dust,

    #[error("peg-in destination must be a spendable script")]
    InvalidDestination,

    #[error("peg-in amounts are out of range: {0}")]
    Amount(#[from] amount::Error),

    #[error("built claiming transaction would be rejected: {0}")]
    Rejected(#[from] TransactionError),
}
