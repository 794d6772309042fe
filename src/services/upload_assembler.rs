use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;

/// One in-flight chunked upload, keyed by (session, filename).
///
/// Chunks may arrive in any order and are buffered per index; the artifact
/// is the concatenation in index order, assembled exactly once when the
/// received set covers `[0, total_chunks)`.
struct ChunkUploadState {
    total_chunks: u32,
    chunks: BTreeMap<u32, Vec<u8>>,
    last_update: Instant,
}

impl ChunkUploadState {
    fn received(&self) -> u32 {
        self.chunks.len() as u32
    }

    fn buffered_bytes(&self) -> usize {
        self.chunks.values().map(Vec::len).sum()
    }

    fn is_complete(&self) -> bool {
        self.received() == self.total_chunks
    }
}

#[derive(Debug)]
pub enum ChunkOutcome {
    InProgress {
        received: u32,
        total: u32,
    },
    Completed {
        file_path: PathBuf,
        file_size: u64,
    },
}

pub struct UploadAssembler {
    uploads: Mutex<HashMap<String, ChunkUploadState>>,
    upload_dir: PathBuf,
    max_file_size: usize,
    stale_after: Duration,
}

impl UploadAssembler {
    pub fn new(upload_dir: impl Into<PathBuf>, max_file_size: usize, stale_after: Duration) -> Self {
        Self {
            uploads: Mutex::new(HashMap::new()),
            upload_dir: upload_dir.into(),
            max_file_size,
            stale_after,
        }
    }

    /// Accept one chunk of an upload. Duplicate indices overwrite
    /// idempotently; a bad payload leaves the upload state untouched so the
    /// client can retry the same chunk.
    pub async fn submit_chunk(
        &self,
        session_id: &str,
        filename: &str,
        chunk_index: u32,
        total_chunks: u32,
        chunk_data: &str,
    ) -> Result<ChunkOutcome, AppError> {
        if total_chunks == 0 {
            return Err(AppError::Validation("total_chunks must be positive".into()));
        }
        if chunk_index >= total_chunks {
            return Err(AppError::Validation(format!(
                "chunk_index {} out of range for {} chunks",
                chunk_index, total_chunks
            )));
        }

        // Decode before touching any state.
        let bytes = BASE64
            .decode(chunk_data)
            .map_err(|e| AppError::Decode(e.to_string()))?;

        let upload_key = format!("{}_{}", session_id, filename);
        let mut uploads = self.uploads.lock().await;
        self.evict_stale(&mut uploads);

        let state = uploads.entry(upload_key.clone()).or_insert_with(|| ChunkUploadState {
            total_chunks,
            chunks: BTreeMap::new(),
            last_update: Instant::now(),
        });

        if state.total_chunks != total_chunks {
            return Err(AppError::InvalidUploadState(format!(
                "total_chunks changed from {} to {} mid-upload",
                state.total_chunks, total_chunks
            )));
        }

        // A resend of an already-buffered index replaces those bytes, so they
        // don't count against the cap twice. The rest of the upload survives a
        // rejected chunk; only staleness evicts it.
        let replaced = state.chunks.get(&chunk_index).map_or(0, Vec::len);
        if state.buffered_bytes() - replaced + bytes.len() > self.max_file_size {
            return Err(AppError::Validation(format!(
                "upload exceeds maximum file size of {} bytes",
                self.max_file_size
            )));
        }

        state.chunks.insert(chunk_index, bytes);
        state.last_update = Instant::now();

        if !state.is_complete() {
            return Ok(ChunkOutcome::InProgress {
                received: state.received(),
                total: state.total_chunks,
            });
        }

        let state = uploads
            .remove(&upload_key)
            .expect("upload state present for completed upload");
        drop(uploads);

        self.finalize(filename, state).await
    }

    async fn finalize(
        &self,
        filename: &str,
        state: ChunkUploadState,
    ) -> Result<ChunkOutcome, AppError> {
        let mut assembled = Vec::with_capacity(state.buffered_bytes());
        for chunk in state.chunks.into_values() {
            assembled.extend_from_slice(&chunk);
        }

        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        let final_path = self.upload_dir.join(format!("{}.{}", Uuid::new_v4(), ext));

        fs::create_dir_all(&self.upload_dir).await?;
        fs::write(&final_path, &assembled).await?;

        log::info!(
            "upload finalized: {} ({} bytes)",
            final_path.display(),
            assembled.len()
        );

        Ok(ChunkOutcome::Completed {
            file_path: final_path,
            file_size: assembled.len() as u64,
        })
    }

    /// Abandoned uploads never see a terminal chunk; drop their buffers once
    /// they go quiet for the configured window.
    fn evict_stale(&self, uploads: &mut HashMap<String, ChunkUploadState>) {
        let stale_after = self.stale_after;
        uploads.retain(|key, state| {
            let keep = state.last_update.elapsed() < stale_after;
            if !keep {
                log::warn!("evicting stale upload state for {}", key);
            }
            keep
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler() -> UploadAssembler {
        let dir = std::env::temp_dir().join(format!("trendle-test-{}", Uuid::new_v4()));
        UploadAssembler::new(dir, 10 * 1024 * 1024, Duration::from_secs(3600))
    }

    fn b64(bytes: &[u8]) -> String {
        BASE64.encode(bytes)
    }

    #[tokio::test]
    async fn assembles_out_of_order_chunks_in_index_order() {
        // Scenario: 300-byte file in three 100-byte pieces, arriving 2, 0, 1.
        let asm = assembler();
        let original: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
        let pieces: Vec<&[u8]> = vec![&original[0..100], &original[100..200], &original[200..300]];

        for &idx in &[2usize, 0, 1] {
            let outcome = asm
                .submit_chunk("s1", "clip.mp4", idx as u32, 3, &b64(pieces[idx]))
                .await
                .unwrap();
            match (&outcome, idx) {
                (ChunkOutcome::Completed { file_path, file_size }, 1) => {
                    assert_eq!(*file_size, 300);
                    let written = std::fs::read(file_path).unwrap();
                    assert_eq!(written, original);
                }
                (ChunkOutcome::InProgress { .. }, 2) | (ChunkOutcome::InProgress { .. }, 0) => {}
                other => panic!("unexpected outcome {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn duplicate_chunk_is_idempotent_overwrite() {
        let asm = assembler();
        let first = asm
            .submit_chunk("s1", "a.mp4", 0, 2, &b64(b"hello"))
            .await
            .unwrap();
        assert!(matches!(first, ChunkOutcome::InProgress { received: 1, total: 2 }));

        // Same index again: still one chunk received, no error.
        let again = asm
            .submit_chunk("s1", "a.mp4", 0, 2, &b64(b"hello"))
            .await
            .unwrap();
        assert!(matches!(again, ChunkOutcome::InProgress { received: 1, total: 2 }));

        match asm.submit_chunk("s1", "a.mp4", 1, 2, &b64(b" world")).await.unwrap() {
            ChunkOutcome::Completed { file_path, .. } => {
                assert_eq!(std::fs::read(file_path).unwrap(), b"hello world");
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bad_base64_leaves_state_unchanged() {
        let asm = assembler();
        asm.submit_chunk("s1", "a.mp4", 0, 3, &b64(b"x")).await.unwrap();

        let err = asm
            .submit_chunk("s1", "a.mp4", 1, 3, "!!not base64!!")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));

        // The retry of the same chunk still counts as the second of three.
        let outcome = asm
            .submit_chunk("s1", "a.mp4", 1, 3, &b64(b"y"))
            .await
            .unwrap();
        assert!(matches!(outcome, ChunkOutcome::InProgress { received: 2, total: 3 }));
    }

    #[tokio::test]
    async fn duplicate_resend_near_size_cap_stays_idempotent() {
        // 100+100+10 bytes against a 250-byte cap: a network-level retry of
        // chunk 0 replaces its bytes instead of double-counting them.
        let dir = std::env::temp_dir().join(format!("trendle-test-{}", Uuid::new_v4()));
        let asm = UploadAssembler::new(dir, 250, Duration::from_secs(3600));

        asm.submit_chunk("s1", "a.mp4", 0, 3, &b64(&[0u8; 100])).await.unwrap();
        asm.submit_chunk("s1", "a.mp4", 1, 3, &b64(&[1u8; 100])).await.unwrap();

        let resend = asm
            .submit_chunk("s1", "a.mp4", 0, 3, &b64(&[0u8; 100]))
            .await
            .unwrap();
        assert!(matches!(resend, ChunkOutcome::InProgress { received: 2, total: 3 }));

        match asm.submit_chunk("s1", "a.mp4", 2, 3, &b64(&[2u8; 10])).await.unwrap() {
            ChunkOutcome::Completed { file_size, .. } => assert_eq!(file_size, 210),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn oversized_chunk_is_rejected_without_dropping_the_upload() {
        let dir = std::env::temp_dir().join(format!("trendle-test-{}", Uuid::new_v4()));
        let asm = UploadAssembler::new(dir, 150, Duration::from_secs(3600));

        asm.submit_chunk("s1", "a.mp4", 0, 2, &b64(&[0u8; 100])).await.unwrap();

        let err = asm
            .submit_chunk("s1", "a.mp4", 1, 2, &b64(&[1u8; 100]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // The first chunk is still buffered; a fitting retry completes.
        match asm.submit_chunk("s1", "a.mp4", 1, 2, &b64(&[1u8; 50])).await.unwrap() {
            ChunkOutcome::Completed { file_size, .. } => assert_eq!(file_size, 150),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn total_chunks_mismatch_is_rejected() {
        let asm = assembler();
        asm.submit_chunk("s1", "a.mp4", 0, 3, &b64(b"x")).await.unwrap();
        let err = asm
            .submit_chunk("s1", "a.mp4", 1, 4, &b64(b"y"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidUploadState(_)));
    }

    #[tokio::test]
    async fn chunk_index_out_of_range_is_rejected() {
        let asm = assembler();
        let err = asm
            .submit_chunk("s1", "a.mp4", 3, 3, &b64(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn uploads_with_different_keys_do_not_interfere() {
        let asm = assembler();
        asm.submit_chunk("s1", "a.mp4", 0, 2, &b64(b"aa")).await.unwrap();
        asm.submit_chunk("s2", "a.mp4", 0, 2, &b64(b"bb")).await.unwrap();

        match asm.submit_chunk("s1", "a.mp4", 1, 2, &b64(b"AA")).await.unwrap() {
            ChunkOutcome::Completed { file_path, .. } => {
                assert_eq!(std::fs::read(file_path).unwrap(), b"aaAA");
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }
}
