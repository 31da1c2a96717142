//! Grid world: the snake, its food, and the reward rules applied on every
//! move.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::action::ActionSpace;
use crate::config::{GameConfig, MAX_GRID_SIZE};
use crate::error::{ConfigError, VisionError};
use crate::food::{self, FoodItem, FoodKind};
use crate::grid::{Grid, GridPosition};
use crate::snake::{Direction, Snake};
use crate::vision::{self, StateKey, VisionSample};

/// Per-episode bookkeeping, cleared by `reset`.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeState {
    /// sum of rewards returned by `step` this episode
    pub reward: f32,
    pub steps: usize,
    /// current growth goal, raised each time it is reached
    pub goal: usize,
    pub max_length: usize,
    pub reached_goal: bool,
    history: VecDeque<GridPosition>,
}

impl EpisodeState {
    fn new(goal: usize, head: Option<GridPosition>, length: usize) -> Self {
        Self {
            reward: 0.0,
            steps: 0,
            goal,
            max_length: length,
            reached_goal: false,
            history: head.into_iter().collect(),
        }
    }

    /// Recent head positions, oldest first.
    pub fn recent_heads(&self) -> &VecDeque<GridPosition> {
        &self.history
    }
}

pub struct Game {
    config: GameConfig,
    grid: Grid,
    rng: StdRng,
    snake: Snake,
    foods: Vec<FoodItem>,
    episode: EpisodeState,
    done: bool,
}

impl Game {
    /// New game with a freshly randomized board. The same seed and config
    /// always produce the same sequence of boards.
    pub fn new(config: GameConfig, seed: u64) -> Result<Game, ConfigError> {
        if config.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::Invalid(format!(
                "grid_size {} above the limit of {MAX_GRID_SIZE}",
                config.grid_size
            )));
        }
        if config.initial_length == 0 || config.grid_size < config.min_grid_size() {
            return Err(ConfigError::Invalid(format!(
                "grid_size {} cannot hold a snake of length {}",
                config.grid_size, config.initial_length
            )));
        }
        let grid = Grid::new(config.grid_size);
        let mut game = Game {
            grid,
            rng: StdRng::seed_from_u64(seed),
            snake: Snake::from_segments(&[], Direction::Up),
            foods: Vec::new(),
            episode: EpisodeState::new(config.goal, None, 0),
            done: false,
            config,
        };
        game.reset();
        Ok(game)
    }

    /// Re-randomizes snake and food, restores the initial goal and clears
    /// the episode counters.
    pub fn reset(&mut self) {
        self.snake = Snake::spawn(
            &mut self.rng,
            self.grid,
            self.config.initial_length,
            self.config.turn_chance,
        );
        self.foods.clear();
        for _ in 0..self.config.beneficial_count {
            food::place(&mut self.rng, self.grid, &self.snake, &mut self.foods, FoodKind::Beneficial);
        }
        for _ in 0..self.config.harmful_count {
            food::place(&mut self.rng, self.grid, &self.snake, &mut self.foods, FoodKind::Harmful);
        }
        self.episode = EpisodeState::new(self.config.goal, self.snake.head(), self.snake.len());
        self.done = false;
    }

    /// Installs an explicit board and starts a new episode on it. Used for
    /// scripted scenarios and replays; the caller is responsible for the
    /// layout being legal.
    pub fn place(&mut self, segments: &[GridPosition], heading: Direction, foods: &[FoodItem]) {
        self.snake = Snake::from_segments(segments, heading);
        self.foods = foods.to_vec();
        self.episode = EpisodeState::new(self.config.goal, self.snake.head(), self.snake.len());
        self.done = false;
    }

    pub fn vision(&self) -> Result<VisionSample, VisionError> {
        vision::cast(&self.snake, &self.foods, self.grid)
    }

    /// Value-table key for the current board under the configured action space.
    pub fn state_key(&self) -> Result<StateKey, VisionError> {
        let v = self.vision()?;
        Ok(self.config.action_space.key(&v, self.snake.heading))
    }

    /// Applies one action. Returns the reward for this move and whether the
    /// episode is over.
    pub fn step(&mut self, action: usize) -> (f32, bool) {
        let (reward, done) = self.advance(action);
        self.episode.reward += reward;
        self.episode.steps += 1;
        if done {
            self.done = true;
        }
        (reward, done)
    }

    fn advance(&mut self, action: usize) -> (f32, bool) {
        let rewards = self.config.rewards.clone();

        let Some(head) = self.snake.head() else {
            tracing::warn!("step on an empty snake");
            return (rewards.invalid, true);
        };

        let heading = match self.config.action_space.resolve(self.snake.heading, action) {
            Some(d) => d,
            None => {
                tracing::warn!(action, space = %self.config.action_space, "unknown action, keeping heading");
                self.snake.heading
            }
        };
        let next = head.offset(heading.delta());

        // nothing is mutated before this check
        if !self.grid.is_inside(next) || self.snake.bites(next) {
            tracing::debug!(x = next.x, y = next.y, "collision");
            return (rewards.collision, true);
        }

        let before = self.nearest_beneficial();
        self.snake.heading = heading;
        self.snake.push_head(next);

        let eaten = food::at(&self.foods, next).map(|i| self.foods.remove(i));
        let mut reward = match eaten {
            Some(FoodItem { kind: FoodKind::Beneficial, .. }) => {
                food::place(&mut self.rng, self.grid, &self.snake, &mut self.foods, FoodKind::Beneficial);
                rewards.beneficial
            }
            Some(FoodItem { kind: FoodKind::Harmful, .. }) => {
                for _ in 0..=self.config.harmful_shrink {
                    self.snake.pop_tail();
                }
                food::place(&mut self.rng, self.grid, &self.snake, &mut self.foods, FoodKind::Harmful);
                if self.snake.is_empty() {
                    tracing::debug!("snake shrank to nothing");
                    return (rewards.starvation, true);
                }
                rewards.harmful
            }
            None => {
                self.snake.pop_tail();
                rewards.step
            }
        };

        // an eaten item was at distance 0
        let after = match eaten {
            Some(FoodItem { kind: FoodKind::Beneficial, .. }) => Some(0),
            _ => self.nearest_beneficial(),
        };
        if let (Some(b), Some(a)) = (before, after) {
            if a < b {
                reward += rewards.closer;
            } else if a > b {
                reward += rewards.farther;
            }
        }

        if self.episode.history.contains(&next) {
            reward += rewards.cycle;
        }
        self.episode.history.push_back(next);
        while self.episode.history.len() > self.config.history_len {
            self.episode.history.pop_front();
        }

        let length = self.snake.len();
        self.episode.max_length = self.episode.max_length.max(length);
        if length >= self.episode.goal {
            reward += rewards.goal;
            self.episode.reached_goal = true;
            tracing::debug!(length, goal = self.episode.goal, "goal reached");
            if self.config.goal_terminates {
                return (reward, true);
            }
            self.episode.goal += self.config.goal_increment;
        }

        (reward, false)
    }

    fn nearest_beneficial(&self) -> Option<u32> {
        self.vision().ok()?.nearest(FoodKind::Beneficial)
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn foods(&self) -> &[FoodItem] {
        &self.foods
    }

    pub fn heading(&self) -> Direction {
        self.snake.heading
    }

    pub fn goal(&self) -> usize {
        self.episode.goal
    }

    pub fn episode(&self) -> &EpisodeState {
        &self.episode
    }

    pub fn grid_size(&self) -> i32 {
        self.grid.size
    }

    pub fn action_space(&self) -> ActionSpace {
        self.config.action_space
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: i32, y: i32) -> GridPosition {
        GridPosition::new(x, y)
    }

    fn game() -> Game {
        Game::new(GameConfig::default(), 1).unwrap()
    }

    #[test]
    fn reset_places_everything() {
        let mut g = game();
        for _ in 0..50 {
            g.reset();
            assert_eq!(g.snake().len(), 3);
            assert_eq!(g.foods().len(), 3);
            let beneficial = g.foods().iter().filter(|f| f.kind == FoodKind::Beneficial).count();
            assert_eq!(beneficial, 2);
            for f in g.foods() {
                assert!(!g.snake().contains(f.position));
            }
            assert_eq!(g.goal(), 10);
            assert_eq!(g.episode().steps, 0);
            assert_eq!(g.episode().recent_heads().len(), 1);
            assert!(!g.is_done());
        }
    }

    #[test]
    fn same_seed_same_board() {
        let a = game();
        let b = game();
        assert_eq!(a.snake(), b.snake());
        assert_eq!(a.foods(), b.foods());
    }

    #[test]
    fn rejects_tiny_grid() {
        assert!(Game::new(GameConfig::new(6), 0).is_err());
    }

    #[test]
    fn plain_move_keeps_length() {
        let mut g = game();
        g.place(&[pos(5, 5), pos(5, 6), pos(5, 7)], Direction::Up, &[FoodItem::new(FoodKind::Beneficial, 0, 0)]);
        let (reward, done) = g.step(Direction::Right.index());
        assert!(!done);
        assert_eq!(reward, -1.0);
        assert_eq!(g.snake().len(), 3);
        assert_eq!(g.snake().head(), Some(pos(6, 5)));
        assert_eq!(g.heading(), Direction::Right);
        assert_eq!(g.episode().steps, 1);
    }

    #[test]
    fn harmful_food_shrinks() {
        let mut g = game();
        g.place(
            &[pos(5, 5), pos(5, 6), pos(5, 7), pos(5, 8)],
            Direction::Up,
            &[FoodItem::new(FoodKind::Harmful, 5, 4), FoodItem::new(FoodKind::Beneficial, 0, 0)],
        );
        let (reward, done) = g.step(Direction::Up.index());
        assert!(!done);
        assert_eq!(reward, -25.0);
        assert_eq!(g.snake().len(), 3);
        assert_eq!(g.snake().head(), Some(pos(5, 4)));
        let harmful: Vec<_> = g.foods().iter().filter(|f| f.kind == FoodKind::Harmful).collect();
        assert_eq!(harmful.len(), 1);
        assert!(!g.snake().contains(harmful[0].position));
    }

    #[test]
    fn harmful_food_on_single_segment_is_terminal() {
        let mut g = game();
        g.place(&[pos(5, 5)], Direction::Up, &[FoodItem::new(FoodKind::Harmful, 5, 4)]);
        let (reward, done) = g.step(Direction::Up.index());
        assert!(done);
        assert_eq!(reward, -200.0);
        assert!(g.snake().is_empty());
        assert_eq!(g.vision(), Err(VisionError::EmptySnake));

        let (reward, done) = g.step(0);
        assert!(done);
        assert_eq!(reward, -200.0);
    }

    #[test]
    fn reversing_into_neck_collides() {
        let mut g = game();
        g.place(&[pos(5, 5), pos(5, 6), pos(5, 7)], Direction::Up, &[]);
        let before = g.snake().clone();
        let (reward, done) = g.step(Direction::Down.index());
        assert!(done);
        assert_eq!(reward, -200.0);
        assert_eq!(g.snake(), &before);
    }

    #[test]
    fn moving_into_vacated_tail_is_allowed() {
        let mut g = game();
        // 2x2 loop: head chases its own tail
        g.place(&[pos(5, 5), pos(6, 5), pos(6, 6), pos(5, 6)], Direction::Up, &[]);
        let (_, done) = g.step(Direction::Down.index());
        assert!(!done);
        assert_eq!(g.snake().head(), Some(pos(5, 6)));
        assert_eq!(g.snake().len(), 4);
    }

    #[test]
    fn shaping_rewards_approach() {
        let mut g = game();
        g.place(&[pos(2, 5)], Direction::Right, &[FoodItem::new(FoodKind::Beneficial, 7, 5)]);
        let (closer, _) = g.step(Direction::Right.index());
        assert_eq!(closer, -1.0 + 2.0);

        g.place(&[pos(2, 5)], Direction::Left, &[FoodItem::new(FoodKind::Beneficial, 7, 5)]);
        let (farther, _) = g.step(Direction::Left.index());
        assert_eq!(farther, -1.0 - 2.0);
    }

    #[test]
    fn eating_counts_as_closer() {
        let mut g = game();
        g.place(
            &[pos(5, 5), pos(5, 6), pos(5, 7)],
            Direction::Up,
            &[FoodItem::new(FoodKind::Beneficial, 5, 4), FoodItem::new(FoodKind::Beneficial, 5, 1)],
        );
        let (reward, done) = g.step(Direction::Up.index());
        assert!(!done);
        assert_eq!(reward, 100.0 + 2.0);
    }

    #[test]
    fn double_shrink_on_harmful_food() {
        let mut config = GameConfig::default();
        config.harmful_shrink = 2;
        let mut g = Game::new(config, 4).unwrap();

        g.place(&[pos(5, 5), pos(5, 6), pos(5, 7)], Direction::Up, &[FoodItem::new(FoodKind::Harmful, 5, 4)]);
        let (reward, done) = g.step(Direction::Up.index());
        assert!(!done);
        assert_eq!(reward, -25.0);
        assert_eq!(g.snake().len(), 1);
        assert_eq!(g.snake().head(), Some(pos(5, 4)));

        g.place(&[pos(5, 5), pos(5, 6)], Direction::Up, &[FoodItem::new(FoodKind::Harmful, 5, 4)]);
        let (reward, done) = g.step(Direction::Up.index());
        assert!(done);
        assert_eq!(reward, -200.0);
        assert!(g.snake().is_empty());
    }

    #[test]
    fn unknown_action_keeps_heading() {
        let mut g = game();
        g.place(&[pos(5, 5), pos(5, 6), pos(5, 7)], Direction::Up, &[]);
        let (reward, done) = g.step(7);
        assert!(!done);
        assert_eq!(reward, -1.0);
        assert_eq!(g.snake().head(), Some(pos(5, 4)));
        assert_eq!(g.heading(), Direction::Up);

        let mut config = GameConfig::default();
        config.action_space = ActionSpace::Relative;
        let mut g = Game::new(config, 4).unwrap();
        g.place(&[pos(5, 5), pos(4, 5)], Direction::Right, &[]);
        g.step(3);
        assert_eq!(g.snake().head(), Some(pos(6, 5)));
        assert_eq!(g.heading(), Direction::Right);
    }

    #[test]
    fn fixed_goal_pays_every_step_at_or_above_it() {
        let mut config = GameConfig::default();
        config.goal = 4;
        config.goal_increment = 0;
        let mut g = Game::new(config, 6).unwrap();
        g.place(
            &[pos(5, 5), pos(5, 6), pos(5, 7)],
            Direction::Right,
            &[FoodItem::new(FoodKind::Beneficial, 6, 5)],
        );
        let (first, _) = g.step(Direction::Right.index());
        assert!(first >= 100.0 + 50.0 - 2.0);
        assert_eq!(g.goal(), 4);

        // keep the replacement food out of sight of the next moves
        let segments: Vec<_> = g.snake().segments().iter().copied().collect();
        g.place(&segments, Direction::Right, &[FoodItem::new(FoodKind::Beneficial, 0, 0)]);
        let (second, done) = g.step(Direction::Up.index());
        assert!(!done);
        assert_eq!(second, -1.0 + 50.0);
        assert_eq!(g.goal(), 4);
        assert_eq!(g.snake().len(), 4);
    }

    #[test]
    fn rejects_oversized_grid() {
        assert!(matches!(
            Game::new(GameConfig::new(MAX_GRID_SIZE + 1), 0),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn goal_is_raised_not_terminal() {
        let mut config = GameConfig::default();
        config.goal = 4;
        let mut g = Game::new(config, 3).unwrap();
        g.place(
            &[pos(5, 5), pos(5, 6), pos(5, 7)],
            Direction::Up,
            &[FoodItem::new(FoodKind::Beneficial, 5, 4)],
        );
        let (reward, done) = g.step(Direction::Up.index());
        assert!(!done);
        assert!(reward >= 100.0 + 50.0 - 2.0);
        assert_eq!(g.goal(), 9);
        assert!(g.episode().reached_goal);
        assert_eq!(g.episode().max_length, 4);
    }

    #[test]
    fn goal_can_end_the_episode() {
        let mut config = GameConfig::default();
        config.goal = 4;
        config.goal_terminates = true;
        let mut g = Game::new(config, 3).unwrap();
        g.place(
            &[pos(5, 5), pos(5, 6), pos(5, 7)],
            Direction::Up,
            &[FoodItem::new(FoodKind::Beneficial, 5, 4)],
        );
        let (reward, done) = g.step(Direction::Up.index());
        assert!(done);
        assert!(reward > 0.0);
        assert_eq!(g.goal(), 4);
    }

    #[test]
    fn relative_actions_follow_heading() {
        let mut config = GameConfig::default();
        config.action_space = ActionSpace::Relative;
        let mut g = Game::new(config, 5).unwrap();
        g.place(&[pos(5, 5), pos(5, 6), pos(5, 7)], Direction::Up, &[]);
        g.step(2); // turn right
        assert_eq!(g.snake().head(), Some(pos(6, 5)));
        assert_eq!(g.heading(), Direction::Right);
        g.step(0); // straight
        assert_eq!(g.snake().head(), Some(pos(7, 5)));
        g.step(1); // turn left
        assert_eq!(g.snake().head(), Some(pos(7, 4)));
        assert_eq!(g.heading(), Direction::Up);
    }

    #[test]
    fn history_is_bounded() {
        let mut config = GameConfig::default();
        config.history_len = 3;
        let mut g = Game::new(config, 9).unwrap();
        g.place(&[pos(1, 5)], Direction::Right, &[]);
        for _ in 0..5 {
            g.step(Direction::Right.index());
        }
        let heads: Vec<_> = g.episode().recent_heads().iter().copied().collect();
        assert_eq!(heads, vec![pos(4, 5), pos(5, 5), pos(6, 5)]);
    }
}
