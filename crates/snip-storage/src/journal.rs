use snip_core::error::{Result, StorageError};
use snip_core::StoredLink;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// An append-only file of newline-delimited JSON link records.
///
/// Every line is a complete [`StoredLink`]. Lines are only ever appended; the
/// file is never compacted or rewritten. Appends are serialized so that
/// concurrent writers never interleave partial lines.
#[derive(Debug)]
pub struct Journal {
    inner: Mutex<JournalFile>,
}

#[derive(Debug)]
struct JournalFile {
    file: File,
    /// The last line on disk lacks its `\n`; the next append terminates it first.
    unterminated: bool,
}

impl Journal {
    /// Opens (creating if needed) the journal at `path` for reading and appending.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .await
            .map_err(|e| StorageError::Io(format!("failed to open {}: {e}", path.display())))?;

        debug!(path = %path.display(), "journal opened");
        Ok(Self::new(file))
    }

    /// Wraps an already open file. It must be readable and opened in append mode.
    pub fn new(file: File) -> Self {
        Self {
            inner: Mutex::new(JournalFile {
                file,
                unterminated: false,
            }),
        }
    }

    /// Reads every record from the start of the file, in file order.
    ///
    /// Blank lines are skipped. The first line that does not decode aborts the
    /// replay with [`StorageError::Decode`]. A final record without a
    /// trailing newline is accepted.
    pub async fn replay(&self) -> Result<Vec<StoredLink>> {
        let mut inner = self.inner.lock().await;
        let unterminated = ends_unterminated(&mut inner.file).await?;
        inner.unterminated = unterminated;
        inner.file.seek(SeekFrom::Start(0)).await?;

        let mut lines = BufReader::new(&mut inner.file).lines();
        let mut records = Vec::new();
        let mut line_no = 0_usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            let record: StoredLink = serde_json::from_str(&line).map_err(|e| {
                StorageError::Decode(format!("journal line {line_no}: {e}"))
            })?;
            trace!(line = line_no, code = %record.hash, "replayed journal record");
            records.push(record);
        }

        Ok(records)
    }

    /// Appends one record as a single line.
    ///
    /// The write is flushed but not synced to disk.
    pub async fn append(&self, link: &StoredLink) -> Result<()> {
        let record = serde_json::to_vec(link).map_err(|e| StorageError::Decode(e.to_string()))?;

        let mut inner = self.inner.lock().await;
        let mut line = Vec::with_capacity(record.len() + 2);
        if inner.unterminated {
            line.push(b'\n');
        }
        line.extend_from_slice(&record);
        line.push(b'\n');

        inner.file.write_all(&line).await?;
        inner.file.flush().await?;
        inner.unterminated = false;

        trace!(code = %link.hash, "appended journal record");
        Ok(())
    }

    /// Flushes pending writes.
    pub async fn flush(&self) -> Result<()> {
        self.inner.lock().await.file.flush().await?;
        Ok(())
    }
}

async fn ends_unterminated(file: &mut File) -> Result<bool> {
    if file.metadata().await?.len() == 0 {
        return Ok(false);
    }

    file.seek(SeekFrom::End(-1)).await?;
    let last = file.read_u8().await?;
    Ok(last != b'\n')
}
