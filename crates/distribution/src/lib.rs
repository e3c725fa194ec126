//! RewardTree distribution
//!
//! Holds per-earner, per-token cumulative amounts in the order the Merkle
//! trees commit to them, and turns them into a two-level Merkle commitment:
//!
//! - `Distribution`: ordered append-only store with leaf index lookup
//! - `load_lines`/`from_lines`: bulk ingestion of unordered raw records
//! - `merklize`: token trees per earner, then the account tree
//! - `generate_claim`: proof bundle for one earner against the root
//!
//! A distribution is mutable until it is merklized. After that `set` and
//! `merklize` fail until `reset_merklization` is called.

mod amount;
mod claim;
mod ingest;
mod merklize;
mod serialized;
mod store;

pub use amount::{parse_amount, AmountParseError};
pub use claim::{generate_claim, Claim, ClaimError, EarnerTreeLeaf, ProofPath, TokenTreeLeaf};
pub use ingest::{
    parse_lines, DuplicatePolicy, EarnerLine, IngestError, IngestOptions, IngestReport,
    ParseErrorPolicy, ParsedLines,
};
pub use merklize::Merklization;
pub use serialized::{SerializedAccount, SerializedDistribution, SerializedError, SerializedToken};
pub use store::{AccountEntry, Distribution, TokenEntry};
