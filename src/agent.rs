use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::AgentConfig;
use crate::table::{self, ValueTable};
use crate::vision::StateKey;

/// Tabular Q-learning agent with epsilon-greedy exploration.
pub struct QAgent {
    table: ValueTable,
    alpha: f32,
    gamma: f32,
    epsilon: f32,
    epsilon_floor: f32,
    epsilon_decay: f32,
    exploit_epsilon: f32,
    rng: StdRng,
}

impl QAgent {
    pub fn new(config: &AgentConfig, actions: usize, seed: u64) -> Self {
        Self::with_table(config, ValueTable::new(actions), seed)
    }

    /// Agent starting from an existing table; scalars come from `config`.
    pub fn with_table(config: &AgentConfig, table: ValueTable, seed: u64) -> Self {
        Self {
            table,
            alpha: config.alpha,
            gamma: config.gamma,
            epsilon: config.epsilon,
            epsilon_floor: config.epsilon_floor,
            epsilon_decay: config.epsilon_decay,
            exploit_epsilon: config.exploit_epsilon,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Picks an action for `state`.
    ///
    /// With `exploit_only` the choice is the greedy one (ties to the lowest
    /// index) and epsilon is pinned to the configured exploit value; no
    /// randomness is drawn. Otherwise epsilon-greedy.
    pub fn select_action(&mut self, state: StateKey, exploit_only: bool) -> usize {
        let actions = self.table.actions();
        let greedy = table::argmax(self.table.row(state));

        if exploit_only {
            self.epsilon = self.exploit_epsilon;
            return greedy;
        }
        if self.rng.r#gen::<f32>() < self.epsilon {
            self.rng.gen_range(0..actions)
        } else {
            greedy
        }
    }

    /// One-step Q-learning update. Returns the change applied to
    /// `Q(state, action)`. An action outside the table is ignored, the same
    /// way `Game::step` ignores it.
    pub fn learn(&mut self, state: StateKey, action: usize, reward: f32, next_state: StateKey) -> f32 {
        if action >= self.table.actions() {
            tracing::warn!(action, actions = self.table.actions(), "update for unknown action skipped");
            return 0.0;
        }
        let next_max = table::max_value(self.table.row(next_state));
        let (alpha, gamma) = (self.alpha, self.gamma);
        let row = self.table.row(state);
        let old = row[action];
        let delta = alpha * (reward + gamma * next_max - old);
        row[action] = old + delta;
        delta
    }

    /// Shrinks epsilon toward its floor. Called once per finished training
    /// episode.
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_floor);
    }

    pub fn q(&self, state: &StateKey, action: usize) -> Option<f32> {
        self.table.get(state).and_then(|row| row.get(action).copied())
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn actions(&self) -> usize {
        self.table.actions()
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon;
    }

    /// Restores learning-rate and discount saved alongside a table.
    pub fn set_rates(&mut self, alpha: f32, gamma: f32) {
        self.alpha = alpha;
        self.gamma = gamma;
    }
}
