//! Snake on a bounded grid with beneficial and harmful food, learned by a
//! tabular Q-learning agent.

pub mod action;
pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod db;
pub mod error;
pub mod food;
pub mod game;
pub mod grid;
pub mod log;
pub mod snake;
pub mod table;
pub mod train;
pub mod utils;
pub mod vision;

pub use action::ActionSpace;
pub use agent::QAgent;
pub use config::{AgentConfig, Config, GameConfig, Rewards, SessionConfig};
pub use food::{FoodItem, FoodKind};
pub use game::Game;
pub use grid::GridPosition;
pub use snake::Direction;
pub use table::ValueTable;
pub use vision::{Sight, StateKey, VisionSample};
