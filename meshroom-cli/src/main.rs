mod media;
mod render;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;
use meshroom_core::utils::{DEFAULT_DISPLAY_NAME, DEFAULT_MAX_PARTICIPANTS, DEFAULT_TTL_HOURS};
use meshroom_session::{
    RoomSession, SessionCollaborators, SessionConfig, SessionEvent, SignalingConfig,
    TransportConfig, WebRtcTransportFactory,
};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshroom")]
#[command(about = "Join a full-mesh media room from the terminal", long_about = None)]
struct Cli {
    /// Signaling server WebSocket URL
    #[arg(long, env = "MESHROOM_URL", default_value = "ws://localhost:8000/ws")]
    url: String,

    /// Name shown to other participants
    #[arg(long, env = "MESHROOM_NAME")]
    name: Option<String>,

    /// STUN server URLs, comma separated
    #[arg(long, env = "MESHROOM_STUN", value_delimiter = ',')]
    stun: Vec<String>,

    /// Heartbeat interval in seconds, 0 disables it
    #[arg(long, default_value_t = 25)]
    keepalive_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new room and wait for others to join
    Create {
        #[arg(long, env = "MESHROOM_TTL_HOURS", default_value_t = DEFAULT_TTL_HOURS)]
        ttl_hours: u32,

        #[arg(long, env = "MESHROOM_MAX_PARTICIPANTS", default_value_t = DEFAULT_MAX_PARTICIPANTS)]
        max_participants: u32,
    },
    /// Join an existing room by its code
    Join { code: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let name = resolve_name(cli.name.clone()).await?;

    let transport_config = if cli.stun.is_empty() {
        TransportConfig::default()
    } else {
        TransportConfig::with_stun_servers(cli.stun.clone())
    };
    let keepalive = (cli.keepalive_secs > 0).then(|| Duration::from_secs(cli.keepalive_secs));
    let signaling_config = SignalingConfig::new(cli.url.clone()).with_keepalive(keepalive);

    let collaborators = SessionCollaborators {
        transports: Arc::new(WebRtcTransportFactory::new(transport_config)),
        media: Arc::new(media::SilentMediaSource),
        render: Arc::new(render::ConsoleRenderSink),
    };

    println!("{} {}", "🔌 Connecting to".cyan(), cli.url.bold());
    let (session, handle, mut events) =
        RoomSession::connect(&signaling_config, &SessionConfig::default(), collaborators)
            .await
            .with_context(|| format!("Failed to connect to {}", cli.url))?;
    let mut run_task = tokio::spawn(session.run());

    let mut in_room = false;
    let mut requested = false;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };

                if let SessionEvent::Connected { .. } = &event
                    && !requested
                {
                    requested = true;
                    match &cli.command {
                        Commands::Create { ttl_hours, max_participants } => {
                            handle.create_room(name.clone(), *ttl_hours, *max_participants).await?;
                        }
                        Commands::Join { code } => {
                            handle.join_room(code, name.clone()).await?;
                        }
                    }
                }

                match &event {
                    SessionEvent::RoomCreated { .. } | SessionEvent::Joined { .. } => in_room = true,
                    SessionEvent::RoomError(err) if !in_room => {
                        bail!("{}", err);
                    }
                    _ => {}
                }

                print_event(&event);
                if let SessionEvent::Left { .. } = event {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n{}", "👋 Leaving room...".yellow());
                handle.leave_room().await?;
                break;
            }
            result = &mut run_task => {
                result.context("Session task panicked")??;
                break;
            }
        }
    }

    Ok(())
}

async fn resolve_name(name: Option<String>) -> Result<String> {
    if let Some(name) = name {
        return Ok(name);
    }
    if !std::io::stdin().is_terminal() {
        return Ok(DEFAULT_DISPLAY_NAME.to_string());
    }

    let name = tokio::task::spawn_blocking(|| {
        Input::<String>::new()
            .with_prompt("Display name")
            .default(DEFAULT_DISPLAY_NAME.to_string())
            .interact_text()
    })
    .await
    .context("Name prompt panicked")?
    .context("Failed to read display name")?;

    Ok(name)
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Connected { self_id } => {
            println!("{} {}", "✅ Connected as".green(), self_id.short().bold());
        }
        SessionEvent::RoomCreated { room_code } => {
            println!(
                "{} {}",
                "🏠 Room created, share this code:".green().bold(),
                room_code.to_string().bold()
            );
        }
        SessionEvent::Joined { room_code, peers } => {
            println!(
                "{} {} ({} already here)",
                "🚪 Joined room".green().bold(),
                room_code.to_string().bold(),
                peers.len()
            );
        }
        SessionEvent::PeerJoined {
            peer_id,
            display_name,
        } => {
            println!(
                "{} {} ({})",
                "➕".green(),
                display_label(display_name.as_deref()).bold(),
                peer_id.short()
            );
        }
        SessionEvent::PeerLeft { peer_id } => {
            println!("{} {}", "➖".yellow(), peer_id.short());
        }
        SessionEvent::PeerStateChanged { .. } => {}
        SessionEvent::PeerUnreachable { peer_id } => {
            println!(
                "{} {}",
                "⚠️  Could not reach".red(),
                peer_id.short().bold()
            );
        }
        SessionEvent::RoomError(err) => {
            println!("{} {}", "❌".red(), err.to_string().red());
        }
        SessionEvent::Left { room_code } => {
            println!("{} {}", "Left room".dimmed(), room_code);
        }
        SessionEvent::Disconnected(err) => {
            println!("{} {}", "🔌 Disconnected:".red().bold(), err);
        }
    }
}

fn display_label(display_name: Option<&str>) -> &str {
    match display_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => DEFAULT_DISPLAY_NAME,
    }
}
