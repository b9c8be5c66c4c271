use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::decode::{Decode, DecodeError, DecodedImage};

/// Speculatively decodes the next photo off the render path.
///
/// At most one decode is ever in flight and at most one result is cached;
/// starting a new prefetch joins and supersedes the previous one. A failed
/// prefetch is dropped with a warning and retried on demand when that photo
/// becomes current, so one bad file never stalls the show.
pub struct Prefetcher<D: Decode> {
    decoder: Arc<D>,
    in_flight: Option<(PathBuf, JoinHandle<Result<DecodedImage, DecodeError>>)>,
    cache: Option<Arc<DecodedImage>>,
}

impl<D: Decode> Prefetcher<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder: Arc::new(decoder),
            in_flight: None,
            cache: None,
        }
    }

    /// Begin decoding `path` in the background, superseding any previous
    /// prefetch.
    pub async fn prefetch(&mut self, path: PathBuf) {
        self.join_in_flight().await;
        if self
            .cache
            .as_ref()
            .is_some_and(|cached| cached.path == path)
        {
            return;
        }
        debug!(path = %path.display(), "prefetching");
        let decoder = Arc::clone(&self.decoder);
        let target = path.clone();
        let handle = tokio::task::spawn_blocking(move || decoder.decode(&target));
        self.in_flight = Some((path, handle));
    }

    /// Produce the image for the photo that is about to become the
    /// foreground.
    ///
    /// Blocks only long enough to join an in-flight prefetch; otherwise the
    /// result comes straight from the cache, falling back to an on-demand
    /// decode when the prefetch missed or failed.
    pub async fn load_current(&mut self, path: &Path) -> Result<Arc<DecodedImage>, DecodeError> {
        self.join_in_flight().await;
        if let Some(cached) = self.cache.take_if(|cached| cached.path == path) {
            return Ok(cached);
        }
        debug!(path = %path.display(), "cache miss; decoding on demand");
        let decoder = Arc::clone(&self.decoder);
        let target = path.to_path_buf();
        match tokio::task::spawn_blocking(move || decoder.decode(&target)).await {
            Ok(result) => result.map(Arc::new),
            Err(err) => {
                warn!(%err, "on-demand decode task failed");
                Err(DecodeError::Task {
                    path: path.to_path_buf(),
                })
            }
        }
    }

    /// Join and discard any in-flight decode so teardown cannot race a
    /// background write.
    pub async fn shutdown(&mut self) {
        if let Some((_, handle)) = self.in_flight.take() {
            let _ = handle.await;
        }
        self.cache = None;
    }

    async fn join_in_flight(&mut self) {
        if let Some((path, handle)) = self.in_flight.take() {
            match handle.await {
                Ok(Ok(image)) => {
                    self.cache = Some(Arc::new(image));
                }
                Ok(Err(err)) => {
                    warn!(%err, "prefetch failed; will retry when the photo becomes current");
                }
                Err(err) => {
                    warn!(%err, path = %path.display(), "prefetch task aborted");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Decoder that counts calls and fails each path a configurable number of
    /// times before succeeding.
    struct ScriptedDecoder {
        calls: AtomicUsize,
        failures_remaining: Mutex<std::collections::HashMap<PathBuf, usize>>,
    }

    impl ScriptedDecoder {
        fn new(failures: &[(&str, usize)]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failures_remaining: Mutex::new(
                    failures
                        .iter()
                        .map(|(p, n)| (PathBuf::from(p), *n))
                        .collect(),
                ),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Decode for ScriptedDecoder {
        fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut failures = self.failures_remaining.lock().unwrap();
            if let Some(n) = failures.get_mut(path) {
                if *n > 0 {
                    *n -= 1;
                    return Err(DecodeError::Io {
                        path: path.to_path_buf(),
                        source: std::io::Error::other("scripted failure"),
                    });
                }
            }
            Ok(DecodedImage {
                path: path.to_path_buf(),
                width: 1,
                height: 1,
                pixels: vec![0, 0, 0, 255],
            })
        }
    }

    #[tokio::test]
    async fn load_current_is_served_from_the_prefetch_cache() {
        let mut prefetcher = Prefetcher::new(ScriptedDecoder::new(&[]));
        prefetcher.prefetch(PathBuf::from("b.jpg")).await;
        let image = prefetcher.load_current(Path::new("b.jpg")).await.unwrap();
        assert_eq!(image.path, PathBuf::from("b.jpg"));
        assert_eq!(prefetcher.decoder.calls(), 1);
    }

    #[tokio::test]
    async fn cache_miss_falls_back_to_on_demand_decode() {
        let mut prefetcher = Prefetcher::new(ScriptedDecoder::new(&[]));
        prefetcher.prefetch(PathBuf::from("b.jpg")).await;
        // Navigation changed the target; the cached image does not match.
        let image = prefetcher.load_current(Path::new("a.jpg")).await.unwrap();
        assert_eq!(image.path, PathBuf::from("a.jpg"));
        assert_eq!(prefetcher.decoder.calls(), 2);
    }

    #[tokio::test]
    async fn failed_prefetch_is_retried_when_the_photo_becomes_current() {
        let mut prefetcher = Prefetcher::new(ScriptedDecoder::new(&[("b.jpg", 1)]));
        prefetcher.prefetch(PathBuf::from("b.jpg")).await;
        // The background decode failed silently; the on-demand retry succeeds.
        let image = prefetcher.load_current(Path::new("b.jpg")).await.unwrap();
        assert_eq!(image.path, PathBuf::from("b.jpg"));
        assert_eq!(prefetcher.decoder.calls(), 2);
    }

    #[tokio::test]
    async fn a_new_prefetch_supersedes_the_previous_one() {
        let mut prefetcher = Prefetcher::new(ScriptedDecoder::new(&[]));
        prefetcher.prefetch(PathBuf::from("b.jpg")).await;
        prefetcher.prefetch(PathBuf::from("c.jpg")).await;
        // Only the most recent result can be in the cache slot once joined.
        let image = prefetcher.load_current(Path::new("c.jpg")).await.unwrap();
        assert_eq!(image.path, PathBuf::from("c.jpg"));
    }

    #[tokio::test]
    async fn undecodable_photo_surfaces_as_a_decode_error() {
        let mut prefetcher = Prefetcher::new(ScriptedDecoder::new(&[("bad.jpg", usize::MAX)]));
        let err = prefetcher.load_current(Path::new("bad.jpg")).await;
        assert!(err.is_err());
    }
}
