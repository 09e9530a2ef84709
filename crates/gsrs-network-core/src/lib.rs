//! Substance network materialization.
//!
//! Given a catalog of substance records that reference each other (a GSRS
//! dump), build for any record a bounded multi-level network of the records
//! reachable from it, ready for a graph-visualization frontend.
//!
//! Pipeline for one root:
//! - [`materialize()`] seeds level 0 with the root node,
//! - [`expand()`] resolves each frontier node's references into nodes and links
//!   under a shared [`TraversalState`] (element and per-node link budgets),
//! - [`legend`] numbers multi-edges and builds the tag/legend index.
//!
//! The core performs no I/O. Records come from a read-only [`RecordStore`];
//! finished documents go to a [`NetworkSink`].

pub mod build;
pub mod classify;
pub mod document;
pub mod error;
pub mod expand;
pub mod generate;
pub mod legend;
pub mod materialize;
pub mod path;
pub mod query;
pub mod record;
pub mod state;

pub use classify::LinkClassifier;
pub use document::{FetchStatus, Legend, Link, NetworkDocument, Node, Tag};
pub use error::{NetworkError, Result};
pub use expand::{expand, Expansion, ExpansionStats, FrontierEntry};
pub use generate::{generate_networks, generate_networks_parallel, GenerationSummary, NetworkSink};
pub use materialize::{materialize, materialize_with_report, MaterializeReport, Materialized, StopReason};
pub use path::{JsonPath, PathPattern, Segment};
pub use record::{RawRecord, RecordOptions, RecordStore};
pub use state::{NetworkOptions, TraversalState};
