use async_trait::async_trait;
use colored::*;
use meshroom_core::PeerId;
use meshroom_session::{MediaKind, NegotiationState, RemoteTrack, RenderSink};

/// Prints remote media and per-peer connection progress to the terminal.
pub struct ConsoleRenderSink;

#[async_trait]
impl RenderSink for ConsoleRenderSink {
    async fn attach_remote_output(&self, peer_id: PeerId, tracks: Vec<RemoteTrack>) {
        let audio = tracks.iter().filter(|t| t.kind == MediaKind::Audio).count();
        let video = tracks.iter().filter(|t| t.kind == MediaKind::Video).count();
        println!(
            "   {} receiving {} audio / {} video from {}",
            "▶".green(),
            audio,
            video,
            peer_id.short().bold()
        );
    }

    async fn detach_remote_output(&self, peer_id: PeerId) {
        println!("   {} stopped output of {}", "■".dimmed(), peer_id.short());
    }

    async fn on_peer_state(&self, peer_id: PeerId, state: NegotiationState) {
        let label = match state {
            NegotiationState::Connected => state.to_string().green().bold(),
            NegotiationState::Disconnected => state.to_string().yellow(),
            NegotiationState::Failed => state.to_string().red().bold(),
            NegotiationState::Closed => state.to_string().dimmed(),
            _ => state.to_string().cyan(),
        };
        println!("   {} {}", peer_id.short().bold(), label);
    }
}
