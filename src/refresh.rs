//! Rate refresh: pull quotes from every source, merge, persist, report.

use crate::core::currency::CurrencyCode;
use crate::core::rates::RateTable;
use crate::providers::QuoteSource;
use crate::store::RatesStore;
use chrono::Utc;
use futures::future::join_all;
use tracing::{info, warn};

/// Per-source result of one refresh run.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source: String,
    pub written: usize,
    pub rejected: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub outcomes: Vec<SourceOutcome>,
    pub total_written: usize,
    /// Persistence failure, surfaced without undoing the in-memory merge.
    pub persist_error: Option<String>,
}

impl RefreshReport {
    pub fn failed_sources(&self) -> usize {
        self.outcomes.iter().filter(|o| o.error.is_some()).count()
    }
}

pub struct RateRefresher<'a> {
    store: &'a dyn RatesStore,
}

impl<'a> RateRefresher<'a> {
    pub fn new(store: &'a dyn RatesStore) -> Self {
        Self { store }
    }

    /// Fetches all sources, merges their quotes into a working copy of the
    /// table, then installs the copy as one swap so readers never observe a
    /// half-merged state. A failed source is recorded and skipped; invalid
    /// quotes are rejected individually. `last_refresh` only advances when
    /// at least one quote was written.
    pub async fn refresh(
        &self,
        table: &mut RateTable,
        sources: &[&dyn QuoteSource],
    ) -> RefreshReport {
        let now = Utc::now();
        let fetches = join_all(
            sources
                .iter()
                .map(|source| async move { (source.id().to_string(), source.fetch().await) }),
        )
        .await;

        let mut merged = table.clone();
        let mut outcomes = Vec::with_capacity(fetches.len());
        let mut total_written = 0;

        for (source_id, result) in fetches {
            match result {
                Ok(quotes) => {
                    let mut written = 0;
                    let mut rejected = 0;
                    for quote in &quotes {
                        let pair = (
                            quote.base.parse::<CurrencyCode>(),
                            quote.quote.parse::<CurrencyCode>(),
                        );
                        let upserted = match pair {
                            (Ok(base), Ok(quote_code)) => merged
                                .upsert(&base, &quote_code, quote.rate, now, &source_id)
                                .is_ok(),
                            _ => false,
                        };
                        if upserted {
                            written += 1;
                        } else {
                            warn!(
                                source = %source_id,
                                base = %quote.base,
                                quote = %quote.quote,
                                rate = quote.rate,
                                "Rejected invalid quote"
                            );
                            rejected += 1;
                        }
                    }
                    info!(source = %source_id, written, rejected, "Source refreshed");
                    total_written += written;
                    outcomes.push(SourceOutcome {
                        source: source_id,
                        written,
                        rejected,
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(source = %source_id, error = %e, "Source fetch failed");
                    outcomes.push(SourceOutcome {
                        source: source_id,
                        written: 0,
                        rejected: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        if total_written > 0 {
            merged.last_refresh = Some(now);
        }
        *table = merged;

        let persist_error = self.store.save(table).err().map(|e| {
            warn!(error = %e, "Failed to persist refreshed rates");
            e.to_string()
        });

        RefreshReport {
            outcomes,
            total_written,
            persist_error,
        }
    }
}
