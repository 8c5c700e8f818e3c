//! Seams to the media collaborators: local capture in, remote output out.

use crate::error::LocalMediaError;
use crate::negotiation::NegotiationState;
use async_trait::async_trait;
use meshroom_core::PeerId;
use std::fmt;
use std::sync::Arc;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

pub type LocalTrack = Arc<dyn TrackLocal + Send + Sync>;

/// Tracks attached to every peer transport of a session.
#[derive(Clone, Default)]
pub struct LocalTracks {
    pub audio: Option<LocalTrack>,
    pub video: Option<LocalTrack>,
}

impl LocalTracks {
    pub fn iter(&self) -> impl Iterator<Item = &LocalTrack> {
        self.audio.iter().chain(self.video.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.video.is_none()
    }
}

impl fmt::Debug for LocalTracks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTracks")
            .field("audio", &self.audio.is_some())
            .field("video", &self.video.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
    Unknown,
}

impl From<RTPCodecType> for MediaKind {
    fn from(kind: RTPCodecType) -> Self {
        match kind {
            RTPCodecType::Audio => MediaKind::Audio,
            RTPCodecType::Video => MediaKind::Video,
            _ => MediaKind::Unknown,
        }
    }
}

/// Remote track announced by a peer transport.
///
/// `track` is empty for transports that do not carry real media.
#[derive(Clone)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: MediaKind,
    pub track: Option<Arc<TrackRemote>>,
}

impl RemoteTrack {
    pub fn from_webrtc(track: Arc<TrackRemote>) -> Self {
        Self {
            id: track.id(),
            stream_id: track.stream_id(),
            kind: MediaKind::from(track.kind()),
            track: Some(track),
        }
    }
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .field("kind", &self.kind)
            .finish()
    }
}

#[async_trait]
pub trait LocalMediaSource: Send + Sync + 'static {
    /// Fails when permission is denied or no devices exist.
    async fn acquire(&self) -> Result<LocalTracks, LocalMediaError>;
}

/// Receives the observable output of the mesh.
#[async_trait]
pub trait RenderSink: Send + Sync + 'static {
    /// Called with the full set of remote tracks known for the peer each time
    /// a new one arrives.
    async fn attach_remote_output(&self, peer_id: PeerId, tracks: Vec<RemoteTrack>);

    async fn detach_remote_output(&self, peer_id: PeerId);

    async fn on_peer_state(&self, _peer_id: PeerId, _state: NegotiationState) {}
}
