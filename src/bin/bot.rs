//! Headless flappy client
//!
//! Connects to a relay, flies a number of runs with a simple autopilot and
//! reports what the replica cache sees of everyone else.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flappy_online::config::BotConfig;
use flappy_online::game::physics::{
    floor_div, PIPE_GAP_Y, PIPE_INTERVAL_X, SCREEN_HEIGHT, SPRITE_HEIGHT, TILE_SIZE,
};
use flappy_online::game::{Course, Flyer};
use flappy_online::util::time::{tick_duration, SIMULATION_TPS};
use flappy_online::RelayClient;

/// Give up on a run after this many ticks
const MAX_RUN_TICKS: u32 = SIMULATION_TPS * 120;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = BotConfig::from_env()?;
    init_tracing(&config.log_level);

    let seed = config.seed.unwrap_or_else(rand::random::<u64>);
    let course = Course::new(seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x5eed);

    info!(name = %config.name, seed, runs = config.runs, "Starting bot");
    let client = RelayClient::connect(&config.relay_url).await?;

    for run in 1..=config.runs {
        let score = fly(&client, &course, &config.name, &mut rng).await;
        info!(run, score, "Run finished");

        // let the standing arrive before reporting
        sleep(Duration::from_millis(500)).await;
        report(&client);

        if !client.is_connected() {
            info!("Relay went away, stopping");
            break;
        }
    }

    client.close().await;
    Ok(())
}

/// Fly one run, sending an update on start, on every jump and on the crash
async fn fly(client: &RelayClient, course: &Course, name: &str, rng: &mut ChaCha8Rng) -> i32 {
    let mut flyer = Flyer::new();
    client.send_update(flyer.to_user(name));

    let mut ticker = interval(tick_duration());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for _ in 0..MAX_RUN_TICKS {
        ticker.tick().await;

        let jump = wants_jump(&flyer, course, rng);
        let crashed = flyer.step(jump, course);
        if jump || crashed {
            client.send_update(flyer.to_user(name));
        }
        if crashed {
            return flyer.score();
        }
    }

    flyer.running = false;
    client.send_update(flyer.to_user(name));
    flyer.score()
}

/// Aim for the middle of the next gap, with a little noise so runs end
fn wants_jump(flyer: &Flyer, course: &Course, rng: &mut ChaCha8Rng) -> bool {
    if flyer.vy16 < 0 {
        return false;
    }

    let tile_x = floor_div(floor_div(flyer.x16, 16), TILE_SIZE);
    let target_y = (tile_x..=tile_x + PIPE_INTERVAL_X)
        .find_map(|x| course.pipe_at(x))
        .map(|gap_y| gap_y * TILE_SIZE + PIPE_GAP_Y * TILE_SIZE / 2)
        .unwrap_or(SCREEN_HEIGHT / 2);
    let centre_y = floor_div(flyer.y16, 16) + SPRITE_HEIGHT / 2;

    centre_y > target_y + TILE_SIZE / 2 && rng.gen_bool(0.8)
}

fn report(client: &RelayClient) {
    for (rank, record) in client.leaderboard().iter().enumerate() {
        info!(rank = rank + 1, name = %record.name, score = record.score, "Standing");
    }
    for replica in client.list_replicas() {
        info!(
            player_id = %replica.id,
            name = %replica.name,
            x16 = replica.x16,
            y16 = replica.y16,
            running = replica.running,
            "Remote player"
        );
    }
}

fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
