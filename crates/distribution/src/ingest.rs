//! Bulk ingestion of raw earner lines.
//!
//! Earner lines arrive unordered and may repeat an (earner, token) pair
//! across snapshots. Ingestion parses amounts, sorts by (earner, token),
//! resolves duplicates per `DuplicatePolicy` and appends into the store.

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use rewardtree_core::{Address, Amount, DistributionError};

use crate::amount::{parse_amount, AmountParseError};
use crate::Distribution;

/// One raw reward record.
///
/// `snapshot` is informational: it picks the winner between duplicate
/// records but never enters a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnerLine {
    pub earner: Address,
    pub token: Address,
    pub snapshot: u64,
    pub cumulative_amount: String,
}

/// What to do with several records for the same (earner, token) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the batch with `DuplicateRecord`
    #[default]
    Reject,
    /// Keep the record with the latest snapshot (larger amount on a tie)
    KeepLatestSnapshot,
    /// Add the amounts together
    Sum,
}

/// What to do with a record whose amount or JSON does not parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorPolicy {
    /// Fail the whole batch
    #[default]
    Abort,
    /// Log and drop the record
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestOptions {
    pub duplicate_policy: DuplicatePolicy,
    pub parse_error_policy: ParseErrorPolicy,
}

/// Counts from one ingestion batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    /// Records handed to the ingestor
    pub records: usize,
    /// (earner, token) pairs written to the distribution
    pub inserted: usize,
    /// Records dropped under `ParseErrorPolicy::Skip`
    pub skipped: usize,
    /// Records folded into another record with the same pair
    pub merged: usize,
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid amount {value:?} in record {record}: {source}")]
    InvalidAmount {
        record: usize,
        value: String,
        source: AmountParseError,
    },

    #[error("Malformed record on line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Duplicate record for earner {earner} token {token}")]
    DuplicateRecord { earner: Address, token: Address },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Distribution(#[from] DistributionError),
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug)]
struct ParsedRecord {
    earner: Address,
    token: Address,
    snapshot: u64,
    amount: Amount,
}

/// Earner lines read from a JSONL source
#[derive(Debug, Clone, Default)]
pub struct ParsedLines {
    pub lines: Vec<EarnerLine>,
    /// Malformed lines dropped under `ParseErrorPolicy::Skip`
    pub skipped: usize,
}

/// Read newline-delimited JSON earner lines. Blank lines are ignored.
pub fn parse_lines<R: BufRead>(reader: R, policy: ParseErrorPolicy) -> Result<ParsedLines> {
    let mut lines = Vec::new();
    let mut skipped = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<EarnerLine>(trimmed) {
            Ok(earner_line) => lines.push(earner_line),
            Err(source) => match policy {
                ParseErrorPolicy::Abort => {
                    return Err(IngestError::Json { line: i + 1, source });
                }
                ParseErrorPolicy::Skip => {
                    warn!("Skipping malformed record on line {}: {}", i + 1, source);
                    skipped += 1;
                }
            },
        }
    }
    debug!("Read {} earner lines, skipped {}", lines.len(), skipped);
    Ok(ParsedLines { lines, skipped })
}

impl Distribution {
    /// Build a distribution from an unordered batch of earner lines.
    pub fn from_lines(
        lines: &[EarnerLine],
        options: &IngestOptions,
    ) -> Result<(Self, IngestReport)> {
        let mut distribution = Self::new();
        let report = distribution.load_lines(lines, options)?;
        Ok((distribution, report))
    }

    /// Parse, sort, de-duplicate and append a batch of earner lines.
    ///
    /// Records are appended with `set`, so a non-empty distribution only
    /// accepts a batch whose pairs all sort after its current contents.
    pub fn load_lines(
        &mut self,
        lines: &[EarnerLine],
        options: &IngestOptions,
    ) -> Result<IngestReport> {
        let mut report = IngestReport {
            records: lines.len(),
            ..Default::default()
        };

        let mut records = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            match parse_amount(&line.cumulative_amount) {
                Ok(amount) => records.push(ParsedRecord {
                    earner: line.earner,
                    token: line.token,
                    snapshot: line.snapshot,
                    amount,
                }),
                Err(source) => match options.parse_error_policy {
                    ParseErrorPolicy::Abort => {
                        return Err(IngestError::InvalidAmount {
                            record: i,
                            value: line.cumulative_amount.clone(),
                            source,
                        });
                    }
                    ParseErrorPolicy::Skip => {
                        warn!(
                            "Skipping record {} for earner {}: invalid amount {:?} ({})",
                            i, line.earner, line.cumulative_amount, source,
                        );
                        report.skipped += 1;
                    }
                },
            }
        }

        // Stable: equal snapshots keep input order
        records.sort_by_key(|r| (r.earner, r.token, r.snapshot));

        let mut merged: Vec<ParsedRecord> = Vec::with_capacity(records.len());
        for record in records {
            if let Some(last) = merged.last_mut() {
                if last.earner == record.earner && last.token == record.token {
                    match options.duplicate_policy {
                        DuplicatePolicy::Reject => {
                            return Err(IngestError::DuplicateRecord {
                                earner: record.earner,
                                token: record.token,
                            });
                        }
                        DuplicatePolicy::KeepLatestSnapshot => {
                            // Sorted by snapshot, so `record` is never older
                            if record.snapshot > last.snapshot || record.amount > last.amount {
                                *last = record;
                            }
                        }
                        DuplicatePolicy::Sum => {
                            last.amount += record.amount;
                            last.snapshot = record.snapshot;
                        }
                    }
                    report.merged += 1;
                    continue;
                }
            }
            merged.push(record);
        }

        // The batch is sorted, so only its first pair can collide with
        // existing contents. Checked before any write.
        if let Some(first) = merged.first() {
            self.check_append(&first.earner, &first.token)?;
        }

        for record in merged {
            self.set(record.earner, record.token, record.amount)?;
            report.inserted += 1;
        }

        info!(
            "Ingested {} records: {} pairs inserted, {} merged, {} skipped",
            report.records, report.inserted, report.merged, report.skipped,
        );

        Ok(report)
    }
}
