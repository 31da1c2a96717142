use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;

use crate::train::EpisodeStats;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Installs the global subscriber. `verbosity` 0 = info, 1 = debug,
/// 2+ = trace. With `file` the log is appended there instead of stdout.
pub fn init(verbosity: u8, file: Option<&Path>) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()));

    let installed = match file {
        Some(path) => {
            let f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(f)).try_init()
        }
        None => builder.try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
}

/// Numeric metric in a fixed, grep-able shape.
pub fn scalar(step: u64, name: &str, value: f32) {
    tracing::info!(target: "scalar", step, name, value = %format!("{value:.6}"));
}

pub fn episode(stats: &EpisodeStats) {
    tracing::info!(
        episode = stats.episode,
        reward = stats.reward,
        steps = stats.steps,
        length = stats.final_length,
        max_length = stats.max_length,
        epsilon = %format!("{:.4}", stats.epsilon),
        goal = stats.reached_goal,
        "episode finished"
    );
    scalar(stats.episode as u64, "reward", stats.reward);
}
