//! Parallel helpers over [`FrameReader`].
//!
//! One failing item never aborts the rest; every item carries its own result.

use camhd_media::Frame;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::{Path, PathBuf};

use crate::config::{BatchConfig, Config};
use crate::reader::FrameReader;
use crate::source::Source;
use crate::Result;

/// Outcome for one batch item.
#[derive(Debug)]
pub struct BatchItem<K, T> {
    pub key: K,
    pub result: Result<T>,
}

impl<K, T> BatchItem<K, T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

fn build_pool(batch: &BatchConfig) -> Result<ThreadPool> {
    Ok(ThreadPoolBuilder::new()
        .num_threads(batch.worker_count())
        .thread_name(|i| format!("camhd-fetch-{}", i))
        .build()?)
}

/// Fetch `frames` from one recording on `workers` threads (0 = one per CPU).
///
/// Results come back in the order of `frames`.
pub fn fetch_frames(
    reader: &FrameReader,
    frames: &[u32],
    workers: usize,
) -> Result<Vec<BatchItem<u32, Frame>>> {
    let pool = build_pool(&BatchConfig { workers })?;
    let items = pool.install(|| {
        frames
            .par_iter()
            .map(|&index| {
                let result = reader.fetch_frame(index);
                if let Err(e) = &result {
                    tracing::warn!(
                        source = %reader.source(),
                        frame = index,
                        error = %e,
                        "frame fetch failed"
                    );
                }
                BatchItem { key: index, result }
            })
            .collect::<Vec<_>>()
    });

    let failed = items.iter().filter(|item| !item.is_ok()).count();
    tracing::info!(
        source = %reader.source(),
        requested = frames.len(),
        failed,
        "batch fetch finished"
    );
    Ok(items)
}

/// Write frame `frame` of every recording in `sources` as an AVI into `dir`.
///
/// Each recording is opened independently with `config`.
pub fn write_frame_across(
    sources: &[Source],
    frame: u32,
    dir: &Path,
    config: &Config,
) -> Result<Vec<BatchItem<Source, PathBuf>>> {
    let pool = build_pool(&config.batch)?;
    let items = pool.install(|| {
        sources
            .par_iter()
            .map(|source| {
                let result = FrameReader::open_location(source, config)
                    .and_then(|reader| reader.write_frame(frame, dir));
                if let Err(e) = &result {
                    tracing::warn!(source = %source, frame, error = %e, "frame export failed");
                }
                BatchItem {
                    key: source.clone(),
                    result,
                }
            })
            .collect::<Vec<_>>()
    });
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_size_follows_batch_config() {
        let pool = build_pool(&BatchConfig { workers: 3 }).unwrap();
        assert_eq!(pool.current_num_threads(), 3);

        let batch = BatchConfig::default();
        let pool = build_pool(&batch).unwrap();
        assert_eq!(pool.current_num_threads(), batch.worker_count());
        assert_eq!(pool.current_num_threads(), num_cpus::get());
    }
}
