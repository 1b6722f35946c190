//! Headless room runner: joins one session, feeds it a few seconds of
//! synthetic input, and logs ring/skill/death events as they fire.
//!
//! Run with:
//!   cargo run -p headless-room

use jelly_room::prelude::*;
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut room = Room::new(0xC0FFEE, LevelConfig::default()).expect("valid default config");
    let handle = room
        .join(
            1,
            JoinOptions {
                name: "demo".to_string(),
                shape_id: 0,
                pigment: (0.9, 0.1, 0.2),
            },
        )
        .expect("join succeeds against a fresh room");
    info!(?handle, "session joined");

    // 10 seconds of fixed ticks, steering toward the arena center every frame.
    for seq in 0..600u32 {
        let input = format!(r#"{{"seq":{seq},"targetX":0.0,"targetY":0.0,"actions":0}}"#);
        room.submit_input(1, input.as_bytes());
        room.update(16.0, |_session_id, _frame| {});
    }

    info!(
        ticks = room.tick_count(),
        game_time = room.game_time(),
        "run complete"
    );
}
