//! # Export File Source
//!
//! Serves a block exporter dump: `blocks.json` and `transactions.json`,
//! one JSON object per line, in the ethereum-etl field layout. Fields the
//! ledger does not keep (`nonce`, `logs_bloom`, `gas_price`, ...) are
//! ignored.
//!
//! Opening the source only indexes the dump: each block row's byte span,
//! and the spans of its transaction rows. A fetch seeks to and decodes the
//! rows of its own page, so memory held between fetches is a few words per
//! row, not the ledger.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use li_01_ledger_store::domain::validation::check_block_shape;
use li_03_page_sync::{BlockSource, EventSink, FetchError, PageRange};
use primitive_types::U256;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared_types::{
    decode_address, decode_hash, decode_hex_bytes, BlockRecord, TransactionRecord,
};
use tracing::{debug, info};

use super::{deliver_concurrently, SourceError};

#[derive(Debug, Deserialize)]
struct ExportBlockRow {
    number: u64,
    hash: String,
    parent_hash: String,
    miner: String,
    timestamp: u64,
    gas_used: u64,
    gas_limit: u64,
    transaction_count: u32,
}

#[derive(Debug, Deserialize)]
struct ExportTransactionRow {
    hash: String,
    block_number: u64,
    transaction_index: u32,
    from_address: String,
    to_address: Option<String>,
    value: serde_json::Value,
    gas: u64,
    input: String,
}

impl ExportBlockRow {
    fn into_record(self) -> Result<BlockRecord, String> {
        let mut block = BlockRecord::header(
            self.number,
            decode_hash(&self.hash).map_err(|e| format!("hash: {e}"))?,
            self.transaction_count,
        );
        block.parent_hash = decode_hash(&self.parent_hash).map_err(|e| format!("parent_hash: {e}"))?;
        block.miner = decode_address(&self.miner).map_err(|e| format!("miner: {e}"))?;
        block.timestamp = self.timestamp;
        block.gas_used = self.gas_used;
        block.gas_limit = self.gas_limit;
        Ok(block)
    }
}

impl ExportTransactionRow {
    fn into_record(self) -> Result<TransactionRecord, String> {
        let mut tx = TransactionRecord::new(
            self.block_number,
            self.transaction_index,
            decode_hash(&self.hash).map_err(|e| format!("hash: {e}"))?,
        );
        tx.from = decode_address(&self.from_address).map_err(|e| format!("from_address: {e}"))?;
        tx.to = match self.to_address.as_deref() {
            None | Some("") => None,
            Some(to) => Some(decode_address(to).map_err(|e| format!("to_address: {e}"))?),
        };
        tx.value = parse_value(&self.value)?;
        tx.gas = self.gas;
        tx.input = decode_hex_bytes(&self.input).map_err(|e| format!("input: {e}"))?;
        Ok(tx)
    }
}

/// Wei amounts appear as JSON numbers or as decimal/hex strings.
fn parse_value(value: &serde_json::Value) -> Result<U256, String> {
    match value {
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(v) => Ok(U256::from(v)),
            None => U256::from_dec_str(&n.to_string()).map_err(|e| format!("value: {e:?}")),
        },
        serde_json::Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| format!("value: {e:?}")),
            None => U256::from_dec_str(s).map_err(|e| format!("value: {e:?}")),
        },
        serde_json::Value::Null => Ok(U256::zero()),
        other => Err(format!("value: unexpected {other}")),
    }
}

/// Fields read while indexing `blocks.json`.
#[derive(Debug, Deserialize)]
struct BlockRowHead {
    number: u64,
    transaction_count: u32,
}

/// Fields read while indexing `transactions.json`.
#[derive(Debug, Deserialize)]
struct TransactionRowHead {
    block_number: u64,
    transaction_index: u32,
}

/// Byte span of one row, newline excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineSpan {
    offset: u64,
    len: u32,
}

#[derive(Debug)]
struct BlockEntry {
    line: LineSpan,
    /// Rows of this block's transactions in `transaction_lines`, by index.
    transactions: Range<usize>,
}

/// Where every exported row lives. Holds offsets only; rows are parsed
/// when their page is fetched.
#[derive(Debug)]
struct ExportIndex {
    blocks_path: PathBuf,
    transactions_path: PathBuf,
    blocks: BTreeMap<u64, BlockEntry>,
    transaction_lines: Vec<LineSpan>,
}

impl ExportIndex {
    /// Read and fully decode the blocks of `range` that the export holds.
    fn load_page(&self, range: PageRange) -> Result<Vec<BlockRecord>, FetchError> {
        let mut blocks_file = open_for_fetch(&self.blocks_path)?;
        let mut transactions_file = open_for_fetch(&self.transactions_path)?;
        let mut buf = Vec::new();

        let mut page = Vec::new();
        for (&number, entry) in self.blocks.range(range.start..range.end) {
            let row: ExportBlockRow =
                read_row(&mut blocks_file, &self.blocks_path, entry.line, &mut buf)?;
            let mut block = row
                .into_record()
                .map_err(|e| FetchError::Malformed(format!("block {number}: {e}")))?;

            for span in &self.transaction_lines[entry.transactions.clone()] {
                let row: ExportTransactionRow =
                    read_row(&mut transactions_file, &self.transactions_path, *span, &mut buf)?;
                let tx = row
                    .into_record()
                    .map_err(|e| FetchError::Malformed(format!("block {number} transaction: {e}")))?;
                block.transactions.push(tx);
            }

            check_block_shape(&block).map_err(|e| FetchError::Malformed(e.to_string()))?;
            page.push(block);
        }
        Ok(page)
    }
}

/// Serves pages out of an exporter dump, reading only the requested page's
/// rows on each fetch.
pub struct ExportFileSource {
    index: Arc<ExportIndex>,
    workers: usize,
    seed: u64,
    fetches: AtomicU64,
}

impl ExportFileSource {
    pub const BLOCKS_FILE: &'static str = "blocks.json";
    pub const TRANSACTIONS_FILE: &'static str = "transactions.json";

    /// Index both files in `dir` and cross-check them.
    ///
    /// Every transaction must belong to an exported block, and every block
    /// must have exactly as many transaction rows as it declares. Only the
    /// numbering fields are parsed here.
    pub fn open(dir: impl AsRef<Path>, workers: usize, seed: u64) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        let blocks_path = dir.join(Self::BLOCKS_FILE);
        let transactions_path = dir.join(Self::TRANSACTIONS_FILE);

        let mut heads: BTreeMap<u64, (LineSpan, u32)> = BTreeMap::new();
        scan_rows::<BlockRowHead, _>(&blocks_path, |head, span| {
            match heads.insert(head.number, (span, head.transaction_count)) {
                Some(_) => Err(format!("block {} exported twice", head.number)),
                None => Ok(()),
            }
        })?;

        let mut tx_rows: Vec<(u64, u32, LineSpan)> = Vec::new();
        scan_rows::<TransactionRowHead, _>(&transactions_path, |head, span| {
            tx_rows.push((head.block_number, head.transaction_index, span));
            Ok(())
        })?;
        if let Some(&(number, _, _)) = tx_rows.iter().find(|(n, _, _)| !heads.contains_key(n)) {
            return Err(SourceError::Inconsistent {
                number,
                reason: "transactions exported for a block that is not".into(),
            });
        }
        tx_rows.sort_unstable_by_key(|&(number, index, _)| (number, index));

        let mut blocks = BTreeMap::new();
        let mut next_row = 0;
        for (number, (line, declared)) in heads {
            let first_row = next_row;
            while let Some(&(n, index, _)) = tx_rows.get(next_row) {
                if n != number {
                    break;
                }
                if index as usize != next_row - first_row {
                    return Err(SourceError::Inconsistent {
                        number,
                        reason: format!("transaction index {index} out of sequence"),
                    });
                }
                next_row += 1;
            }
            let found = next_row - first_row;
            if found != declared as usize {
                return Err(SourceError::Inconsistent {
                    number,
                    reason: format!("declares {declared} transactions, export has {found}"),
                });
            }
            blocks.insert(
                number,
                BlockEntry {
                    line,
                    transactions: first_row..next_row,
                },
            );
        }
        let transaction_lines = tx_rows.into_iter().map(|(_, _, span)| span).collect();

        info!(
            "[li-rt] Indexed export {:?}: {} blocks{}",
            dir,
            blocks.len(),
            match (blocks.keys().next(), blocks.keys().next_back()) {
                (Some(first), Some(last)) => format!(" ({first}..={last})"),
                _ => String::new(),
            }
        );

        Ok(Self {
            index: Arc::new(ExportIndex {
                blocks_path,
                transactions_path,
                blocks,
                transaction_lines,
            }),
            workers,
            seed,
            fetches: AtomicU64::new(0),
        })
    }

    /// Number of exported blocks.
    pub fn len(&self) -> usize {
        self.index.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.blocks.is_empty()
    }
}

/// Walk `path` row by row, handing each row's numbering fields and byte
/// span to `handle`.
fn scan_rows<T, F>(path: &Path, mut handle: F) -> Result<(), SourceError>
where
    T: DeserializeOwned,
    F: FnMut(T, LineSpan) -> Result<(), String>,
{
    let io_error = |source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = BufReader::new(File::open(path).map_err(io_error)?);
    let mut line = Vec::new();
    let mut offset = 0u64;
    let mut line_no = 0usize;

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line).map_err(io_error)?;
        if read == 0 {
            return Ok(());
        }
        line_no += 1;
        let start = offset;
        offset += read as u64;

        let end = line
            .iter()
            .rposition(|b| !matches!(b, b'\n' | b'\r'))
            .map_or(0, |p| p + 1);
        let text = &line[..end];
        if text.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let parse_error = |reason: String| SourceError::Parse {
            path: path.to_path_buf(),
            line: line_no,
            reason,
        };
        let len = u32::try_from(text.len()).map_err(|_| parse_error("row too long".into()))?;
        let head: T = serde_json::from_slice(text).map_err(|e| parse_error(e.to_string()))?;
        handle(head, LineSpan { offset: start, len }).map_err(parse_error)?;
    }
}

fn open_for_fetch(path: &Path) -> Result<File, FetchError> {
    File::open(path).map_err(|e| FetchError::Network(format!("cannot open {}: {e}", path.display())))
}

fn read_row<T: DeserializeOwned>(
    file: &mut File,
    path: &Path,
    span: LineSpan,
    buf: &mut Vec<u8>,
) -> Result<T, FetchError> {
    buf.resize(span.len as usize, 0);
    file.seek(SeekFrom::Start(span.offset))
        .and_then(|_| file.read_exact(buf))
        .map_err(|e| FetchError::Network(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_slice(buf)
        .map_err(|e| FetchError::Malformed(format!("{} at byte {}: {e}", path.display(), span.offset)))
}

#[async_trait]
impl BlockSource for ExportFileSource {
    async fn fetch_page(&self, range: PageRange, sink: EventSink) -> Result<(), FetchError> {
        let fetch_no = self.fetches.fetch_add(1, Ordering::Relaxed);
        let index = Arc::clone(&self.index);
        let page = tokio::task::spawn_blocking(move || index.load_page(range))
            .await
            .map_err(|e| FetchError::TaskFailed(e.to_string()))??;
        debug!("[li-rt] Read {} exported blocks for page {}", page.len(), range);

        let missing = range.numbers().find(|n| !self.index.blocks.contains_key(n));

        deliver_concurrently(page, sink, self.workers, self.seed ^ range.start ^ (fetch_no << 32))
            .await?;

        match missing {
            Some(number) => Err(FetchError::Incomplete {
                range,
                detail: format!("block {number} is not in the export"),
            }),
            None => Ok(()),
        }
    }

    async fn latest_block(&self) -> Result<Option<u64>, FetchError> {
        Ok(self.index.blocks.keys().next_back().copied())
    }

    fn name(&self) -> &str {
        "export"
    }
}
