use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::ActionSpace;
use crate::error::ConfigError;

/// Largest accepted board side.
pub const MAX_GRID_SIZE: i32 = 1024;

/// Reward magnitudes. Only signs and the ordering
/// `collision < harmful < step < 0 < beneficial` matter for correctness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rewards {
    /// wall or body hit
    pub collision: f32,
    /// harmful food shrank the snake to nothing
    pub starvation: f32,
    /// step asked of a snake with no segments
    pub invalid: f32,
    pub harmful: f32,
    pub step: f32,
    pub beneficial: f32,
    /// moved closer to the nearest visible beneficial food
    pub closer: f32,
    pub farther: f32,
    /// head returned to a recently visited cell
    pub cycle: f32,
    /// length reached the growth goal
    pub goal: f32,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            collision: -200.0,
            starvation: -200.0,
            invalid: -200.0,
            harmful: -25.0,
            step: -1.0,
            beneficial: 100.0,
            closer: 2.0,
            farther: -2.0,
            cycle: -5.0,
            goal: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid_size: i32,
    pub initial_length: usize,
    pub beneficial_count: usize,
    pub harmful_count: usize,
    /// growth goal at the start of every episode
    pub goal: usize,
    /// added to the goal once reached; 0 keeps it fixed
    pub goal_increment: usize,
    /// end the episode when the goal is reached instead of raising it
    pub goal_terminates: bool,
    pub history_len: usize,
    /// tail segments removed on harmful food beyond the normal pop
    pub harmful_shrink: usize,
    pub turn_chance: f32,
    pub action_space: ActionSpace,
    pub rewards: Rewards,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            initial_length: 3,
            beneficial_count: 2,
            harmful_count: 1,
            goal: 10,
            goal_increment: 5,
            goal_terminates: false,
            history_len: 10,
            harmful_shrink: 1,
            turn_chance: 0.3,
            action_space: ActionSpace::Absolute,
            rewards: Rewards::default(),
        }
    }
}

impl GameConfig {
    pub fn new(grid_size: i32) -> Self {
        Self {
            grid_size,
            ..Default::default()
        }
    }

    /// Smallest board where the spawn margin leaves room for the head.
    pub fn min_grid_size(&self) -> i32 {
        i32::try_from(self.initial_length)
            .unwrap_or(i32::MAX)
            .saturating_add(1)
            .saturating_mul(2)
            .saturating_add(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// learning rate
    pub alpha: f32,
    /// discount factor
    pub gamma: f32,
    /// exploration rate at the start of training
    pub epsilon: f32,
    pub epsilon_floor: f32,
    /// multiplicative decay applied once per finished episode
    pub epsilon_decay: f32,
    /// exploration rate forced by exploit-only selection
    pub exploit_epsilon: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 1.0,
            epsilon_floor: 0.01,
            epsilon_decay: 0.995,
            exploit_epsilon: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub episodes: usize,
    /// step budget per episode
    pub max_steps: usize,
    pub seed: Option<u64>,
    pub learn: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            max_steps: 500,
            seed: None,
            learn: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub agent: AgentConfig,
    pub session: SessionConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.game;
        let a = &self.agent;
        let r = &g.rewards;
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if g.initial_length == 0 {
            return invalid("initial_length must be at least 1".into());
        }
        if g.grid_size > MAX_GRID_SIZE {
            return invalid(format!("grid_size {} above the limit of {MAX_GRID_SIZE}", g.grid_size));
        }
        if g.grid_size < g.min_grid_size() {
            return invalid(format!(
                "grid_size {} too small for a snake of length {} (need {})",
                g.grid_size,
                g.initial_length,
                g.min_grid_size()
            ));
        }
        let cells = (g.grid_size as usize).pow(2);
        if g.initial_length + g.beneficial_count + g.harmful_count > cells {
            return invalid("snake and food do not fit on the board".into());
        }
        if g.history_len == 0 {
            return invalid("history_len must be at least 1".into());
        }
        if !(1..=2).contains(&g.harmful_shrink) {
            return invalid(format!("harmful_shrink must be 1 or 2, got {}", g.harmful_shrink));
        }
        if !(0.0..=1.0).contains(&g.turn_chance) {
            return invalid(format!("turn_chance {} outside [0, 1]", g.turn_chance));
        }
        if !(r.collision < r.harmful && r.harmful < r.step && r.step < 0.0 && r.beneficial > 0.0) {
            return invalid("rewards must satisfy collision < harmful < step < 0 < beneficial".into());
        }

        if !(a.alpha > 0.0 && a.alpha <= 1.0) {
            return invalid(format!("alpha {} outside (0, 1]", a.alpha));
        }
        if !(0.0..=1.0).contains(&a.gamma) {
            return invalid(format!("gamma {} outside [0, 1]", a.gamma));
        }
        for (name, eps) in [
            ("epsilon", a.epsilon),
            ("epsilon_floor", a.epsilon_floor),
            ("exploit_epsilon", a.exploit_epsilon),
        ] {
            if !(0.0..=1.0).contains(&eps) {
                return invalid(format!("{name} {eps} outside [0, 1]"));
            }
        }
        if !(a.epsilon_decay > 0.0 && a.epsilon_decay <= 1.0) {
            return invalid(format!("epsilon_decay {} outside (0, 1]", a.epsilon_decay));
        }

        if self.session.max_steps == 0 {
            return invalid("max_steps must be at least 1".into());
        }
        Ok(())
    }
}
