//! Batch generation: one network document per root record.

use std::fmt::Display;

use rayon::prelude::*;
use tracing::{debug, error, warn};

use crate::classify::LinkClassifier;
use crate::document::NetworkDocument;
use crate::materialize::{materialize_with_report, StopReason};
use crate::record::{RawRecord, RecordStore};
use crate::state::NetworkOptions;

/// Destination for finished documents.
///
/// Implementations must tolerate concurrent calls for different roots when
/// used with [`generate_networks_parallel`].
pub trait NetworkSink: Sync {
    type Error: Display;

    fn write(&self, root_id: &str, document: &NetworkDocument) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub written: usize,
    pub failed: usize,
    /// Requested roots absent from the store.
    pub missing_roots: usize,
    /// Documents cut short by the element budget.
    pub budget_exhausted: usize,
}

impl GenerationSummary {
    fn merge(mut self, other: GenerationSummary) -> GenerationSummary {
        self.written += other.written;
        self.failed += other.failed;
        self.missing_roots += other.missing_roots;
        self.budget_exhausted += other.budget_exhausted;
        self
    }
}

/// Materializes and writes every selected root in order.
///
/// `roots` restricts generation to the given ids; `None` means every record
/// in store order. A failed write is logged and counted, never fatal.
pub fn generate_networks<S: NetworkSink>(
    store: &RecordStore,
    roots: Option<&[String]>,
    options: &NetworkOptions,
    classifier: &LinkClassifier,
    sink: &S,
) -> GenerationSummary {
    let (records, missing) = select_roots(store, roots);
    records
        .into_iter()
        .map(|root| generate_one(root, store, options, classifier, sink))
        .fold(missing, GenerationSummary::merge)
}

/// Like [`generate_networks`] but materializes roots on the rayon pool.
/// Each run owns its state; only the store and classifier are shared.
pub fn generate_networks_parallel<S: NetworkSink>(
    store: &RecordStore,
    roots: Option<&[String]>,
    options: &NetworkOptions,
    classifier: &LinkClassifier,
    sink: &S,
) -> GenerationSummary {
    let (records, missing) = select_roots(store, roots);
    records
        .into_par_iter()
        .map(|root| generate_one(root, store, options, classifier, sink))
        .reduce(GenerationSummary::default, GenerationSummary::merge)
        .merge(missing)
}

fn select_roots<'a>(
    store: &'a RecordStore,
    roots: Option<&[String]>,
) -> (Vec<&'a RawRecord>, GenerationSummary) {
    let mut summary = GenerationSummary::default();
    let Some(ids) = roots else {
        return (store.iter().collect(), summary);
    };
    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        match store.get(id) {
            Some(record) => records.push(record),
            None => {
                warn!(uuid = %id, "requested root not found in store");
                summary.missing_roots += 1;
            }
        }
    }
    (records, summary)
}

fn generate_one<S: NetworkSink>(
    root: &RawRecord,
    store: &RecordStore,
    options: &NetworkOptions,
    classifier: &LinkClassifier,
    sink: &S,
) -> GenerationSummary {
    debug!(uuid = root.id(), "processing root");
    let result = materialize_with_report(root, store, options, classifier);
    let mut summary = GenerationSummary::default();
    if result.report.stop == StopReason::BudgetExhausted {
        summary.budget_exhausted += 1;
    }
    match sink.write(root.id(), &result.document) {
        Ok(()) => summary.written += 1,
        Err(err) => {
            error!(uuid = root.id(), error = %err, "failed to write network document");
            summary.failed += 1;
        }
    }
    summary
}
