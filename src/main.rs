//! Hide-and-Seek Simulation
//!
//! Headless driver for the simulation core. With no flags it runs a scripted
//! offline session against an in-memory transport and logs the resulting
//! world hash. With `--connect` it logs in to the configured server and
//! walks right until the connection closes.
//!
//! Usage: `hideseek-sim [config.json] [--connect]`

use anyhow::Context;
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use hideseek::{
    ClientConfig, ClientSession, InputFrame, TileMap, VERSION,
    network::{connect, run_client, transport::CHANNEL_CAPACITY, ChannelTransport},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Hideseek Sim v{}", VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let online = args.iter().any(|a| a == "--connect");
    let config = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => ClientConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => ClientConfig::default(),
    };

    let map = match TileMap::load(&config.map_path) {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "Using built-in demo map");
            demo_map()
        }
    };
    info!(width = map.width(), height = map.height(), "Map ready");

    if online {
        play_online(map, config).await
    } else {
        demo_session(map, config)
    }
}

/// 10x10 room: walled border, one door, one hiding spot.
fn demo_map() -> TileMap {
    let mut rows = vec![vec![0i64; 10]; 10];
    for i in 0..10 {
        rows[0][i] = 1;
        rows[9][i] = 1;
        rows[i][0] = 1;
        rows[i][9] = 1;
    }
    rows[4][5] = 2;
    rows[7][2] = 3;
    TileMap::from_codes(rows)
}

/// Scripted offline session: login, walk, get grabbed by a hunter.
fn demo_session(map: TileMap, config: ClientConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Session ===");

    let (transport, mut outbound) = ChannelTransport::pair(CHANNEL_CAPACITY);
    let mut session = ClientSession::new(map, transport, config);
    let mut events = session.subscribe_events();

    session.login("demo")?;
    session.handle_text(
        r#"{"type":"login_response","success":true,"player_id":"p1","username":"demo"}"#,
    )?;
    session.handle_text(r#"{"type":"player_list","players":{"p1":"demo","p2":"bob"}}"#)?;

    // One second of walking right
    let right = InputFrame::with_keys(false, false, false, true);
    for _ in 0..60 {
        session.frame(1.0 / 60.0, right);
    }

    let Some(position) = session.state().actors.local().map(|a| a.position) else {
        anyhow::bail!("local player missing after login");
    };
    info!(x = position.x, y = position.y, "Walked");

    // A hunter arrives on top of us and picks us up
    let snapshot = json!({
        "type": "state",
        "positions": { "p2": { "x": 400.0, "y": 400.0 } },
        "doors": { "5,4": true },
        "hunters": { "h1": { "x": position.x + 5.0, "y": position.y, "carrying": "p1" } },
    });
    session.handle_text(&snapshot.to_string())?;

    // Carried: input no longer moves us
    for _ in 0..30 {
        session.frame(1.0 / 60.0, right);
    }

    while let Ok(event) = events.try_recv() {
        info!(?event, "Event");
    }
    let mut sent = 0;
    while outbound.try_recv().is_ok() {
        sent += 1;
    }

    info!("=== Session Results ===");
    info!(actors = session.state().actors.len(), ticks = session.state().tick, sent, "Summary");
    info!("Final State Hash: {}", hex::encode(session.state().compute_hash()));
    Ok(())
}

/// Log in to the configured server and walk right until disconnected.
async fn play_online(map: TileMap, config: ClientConfig) -> anyhow::Result<()> {
    let connection = connect(&config.endpoint).await?;
    let mut session = ClientSession::new(map, connection.outgoing, config);
    session.login("demo")?;

    let (_input_tx, input_rx) = watch::channel(InputFrame::with_keys(false, false, false, true));
    run_client(&mut session, connection.incoming, input_rx).await;

    info!("Final State Hash: {}", hex::encode(session.state().compute_hash()));
    Ok(())
}
