use async_trait::async_trait;
use meshroom_session::{LocalMediaError, LocalMediaSource, LocalTracks};
use std::sync::Arc;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const STREAM_ID: &str = "meshroom";

/// Publishes an Opus and a VP8 track without attaching a capture device.
///
/// Peers negotiate both media sections; no samples are written.
pub struct SilentMediaSource;

#[async_trait]
impl LocalMediaSource for SilentMediaSource {
    async fn acquire(&self) -> Result<LocalTracks, LocalMediaError> {
        let audio = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
                rtcp_feedback: vec![],
            },
            "audio".to_owned(),
            STREAM_ID.to_owned(),
        ));

        let video = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                channels: 0,
                sdp_fmtp_line: String::new(),
                rtcp_feedback: vec![],
            },
            "video".to_owned(),
            STREAM_ID.to_owned(),
        ));

        Ok(LocalTracks {
            audio: Some(audio),
            video: Some(video),
        })
    }
}
