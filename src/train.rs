//! The driver: alternates observation, action and learning until the episode
//! ends, then resets the board and decays exploration.

use std::time::{Duration, Instant};

use crate::agent::QAgent;
use crate::db::History;
use crate::error::{SessionError, VisionError};
use crate::game::Game;
use crate::log;
use crate::utils::{Stats, has_non_finite, vec_stats};

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStats {
    pub episode: usize,
    pub reward: f32,
    pub steps: usize,
    pub max_length: usize,
    pub final_length: usize,
    /// exploration rate the episode was played with
    pub epsilon: f32,
    pub reached_goal: bool,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub episodes: usize,
    pub max_steps: usize,
    /// false = exploit-only play: no updates, no epsilon decay
    pub learn: bool,
    /// print the snake's vision every step
    pub show_vision: bool,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub episodes: usize,
    pub rewards: Stats,
    pub best_length: usize,
    pub goals_reached: usize,
    pub slowest: Duration,
    pub total_steps: usize,
}

/// Plays one episode on `game` as it currently stands. Does not reset the
/// board afterwards.
///
/// A snake that shrinks to nothing keeps the last state key for the final
/// update. Any other vision failure means the board is corrupt and ends the
/// episode with an error.
pub fn run_episode(
    game: &mut Game,
    agent: &mut QAgent,
    episode: usize,
    max_steps: usize,
    learn: bool,
    show_vision: bool,
) -> Result<EpisodeStats, VisionError> {
    let start = Instant::now();
    let epsilon = agent.epsilon();
    let mut state = game.state_key()?;

    for _ in 0..max_steps {
        if show_vision {
            if let Ok(v) = game.vision() {
                println!("{v}\n{}\n", v.compass());
            }
        }

        let action = agent.select_action(state, !learn);
        let (reward, done) = game.step(action);
        let next = match game.state_key() {
            Ok(key) => key,
            Err(VisionError::EmptySnake) => state,
            Err(err) => {
                tracing::error!(error = %err, episode, "board corrupt after step");
                return Err(err);
            }
        };

        if learn {
            agent.learn(state, action, reward, next);
            if agent.table().get(&state).is_some_and(has_non_finite) {
                tracing::warn!(%state, "non-finite value in table");
            }
        }
        tracing::trace!(%state, action, reward, done, "step");

        state = next;
        if done {
            break;
        }
    }

    let ep = game.episode();
    Ok(EpisodeStats {
        episode,
        reward: ep.reward,
        steps: ep.steps,
        max_length: ep.max_length,
        final_length: game.snake().len(),
        epsilon: if learn { epsilon } else { agent.epsilon() },
        reached_goal: ep.reached_goal,
        duration: start.elapsed(),
    })
}

/// Runs `settings.episodes` episodes, resetting the game after each and
/// decaying epsilon when learning. Episodes are recorded to `history`
/// under the given run id when provided.
pub fn run_session(
    game: &mut Game,
    agent: &mut QAgent,
    settings: &SessionSettings,
    history: Option<(&History, &str)>,
) -> Result<SessionSummary, SessionError> {
    let mut rewards = Vec::with_capacity(settings.episodes);
    let mut best_length = 0;
    let mut goals_reached = 0;
    let mut slowest = Duration::ZERO;
    let mut total_steps = 0;

    for episode in 0..settings.episodes {
        let stats = run_episode(
            game,
            agent,
            episode,
            settings.max_steps,
            settings.learn,
            settings.show_vision,
        )
        .map_err(|source| SessionError::Vision { episode, source })?;
        log::episode(&stats);
        if let Some((history, run)) = history {
            history.record(run, &stats)?;
        }

        rewards.push(stats.reward);
        best_length = best_length.max(stats.max_length);
        goals_reached += stats.reached_goal as usize;
        slowest = slowest.max(stats.duration);
        total_steps += stats.steps;

        game.reset();
        if settings.learn {
            agent.decay_epsilon();
        }
    }

    Ok(SessionSummary {
        episodes: settings.episodes,
        rewards: vec_stats(&rewards),
        best_length,
        goals_reached,
        slowest,
        total_steps,
    })
}
