use async_trait::async_trait;
use meshroom_session::{LocalMediaError, LocalMediaSource, LocalTracks};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Media source that succeeds without producing real tracks.
#[derive(Clone, Default)]
pub struct StaticMediaSource {
    acquired: Arc<AtomicUsize>,
}

impl StaticMediaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalMediaSource for StaticMediaSource {
    async fn acquire(&self) -> Result<LocalTracks, LocalMediaError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(LocalTracks::default())
    }
}

/// Media source whose user refused capture permission.
#[derive(Clone, Default)]
pub struct DeniedMediaSource;

#[async_trait]
impl LocalMediaSource for DeniedMediaSource {
    async fn acquire(&self) -> Result<LocalTracks, LocalMediaError> {
        Err(LocalMediaError::PermissionDenied)
    }
}
