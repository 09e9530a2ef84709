//! Loading a GSRS dump (one JSON substance per line) into a [`RecordStore`].

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::bufread::MultiGzDecoder;
use gsrs_network_core::{RawRecord, RecordOptions, RecordStore};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
    pub duplicates: usize,
}

/// First two bytes of every gzip member.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Opens `path` (or stdin for `-`) and loads every record. Gzip-compressed
/// input (a `.gsrs` export) is detected by its magic bytes.
pub fn load_store(path: &Path, options: RecordOptions) -> Result<(RecordStore, LoadReport)> {
    let (store, report) = if path.as_os_str() == "-" {
        read_maybe_compressed(io::stdin().lock(), options).context("failed to read dump from stdin")?
    } else {
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        read_maybe_compressed(BufReader::new(file), options)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    info!(
        records = report.loaded,
        skipped = report.skipped,
        duplicates = report.duplicates,
        "loaded dump"
    );
    Ok((store, report))
}

pub fn read_maybe_compressed(
    mut reader: impl BufRead,
    options: RecordOptions,
) -> Result<(RecordStore, LoadReport)> {
    if reader.fill_buf()?.starts_with(&GZIP_MAGIC) {
        debug!("input is gzip-compressed");
        read_store(BufReader::new(MultiGzDecoder::new(reader)), options)
    } else {
        read_store(reader, options)
    }
}

/// Reads JSON-lines records. Lines that are not valid UTF-8 or not valid
/// records are logged and skipped; only I/O errors abort the load.
pub fn read_store(mut reader: impl BufRead, options: RecordOptions) -> Result<(RecordStore, LoadReport)> {
    let mut store = RecordStore::new(options);
    let mut report = LoadReport::default();
    let mut buf = Vec::new();
    let mut line_number = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;

        let text = match std::str::from_utf8(&buf) {
            Ok(text) => text.trim(),
            Err(err) => {
                warn!(line = line_number, error = %err, "skipping line that is not valid UTF-8");
                report.skipped += 1;
                continue;
            }
        };
        if text.is_empty() {
            continue;
        }
        match RawRecord::from_json(text, store.options()) {
            Ok(record) => {
                let id = record.id().to_string();
                if store.insert(record).is_some() {
                    debug!(uuid = %id, line = line_number, "duplicate record replaces earlier one");
                    report.duplicates += 1;
                } else {
                    report.loaded += 1;
                }
            }
            Err(err) => {
                warn!(line = line_number, error = %err, "skipping malformed record");
                report.skipped += 1;
            }
        }
    }
    Ok((store, report))
}
