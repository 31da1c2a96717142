use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use snake_qlearn::checkpoint;
use snake_qlearn::db::{self, History};
use snake_qlearn::log;
use snake_qlearn::train::{self, SessionSettings};
use snake_qlearn::{ActionSpace, Config, Game, QAgent};

#[derive(Parser, Debug)]
#[command(name = "snake_qlearn", about = "Snake + tabular Q-learning")]
struct Args {
    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    episodes: Option<usize>,
    /// step budget per episode
    #[arg(long)]
    max_steps: Option<usize>,
    #[arg(long)]
    grid_size: Option<i32>,
    /// snake length to reach
    #[arg(long)]
    goal: Option<usize>,
    /// learning rate
    #[arg(long)]
    alpha: Option<f32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum)]
    action_space: Option<ActionSpace>,
    /// value table to start from
    #[arg(long)]
    load: Option<PathBuf>,
    /// where to write the value table after training (.json for JSON)
    #[arg(long)]
    save: Option<PathBuf>,
    /// SQLite file collecting per-episode results
    #[arg(long)]
    history: Option<PathBuf>,
    /// play greedily without learning
    #[arg(long)]
    dontlearn: bool,
    /// start exploring again from the configured epsilon after --load
    #[arg(long)]
    reset_epsilon: bool,
    /// print what the snake sees every step
    #[arg(long)]
    vision: bool,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn build_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if args.dontlearn {
        config.session.learn = false;
        // play mode: one game unless asked otherwise
        config.session.episodes = 1;
    }
    if let Some(v) = args.episodes {
        config.session.episodes = v;
    }
    if let Some(v) = args.max_steps {
        config.session.max_steps = v;
    }
    if let Some(v) = args.grid_size {
        config.game.grid_size = v;
    }
    if let Some(v) = args.goal {
        config.game.goal = v;
    }
    if let Some(v) = args.alpha {
        config.agent.alpha = v;
    }
    if let Some(v) = args.action_space {
        config.game.action_space = v;
    }
    if args.seed.is_some() {
        config.session.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    log::init(args.verbose, args.log_file.as_deref())?;

    let config = build_config(&args)?;
    let seed = config.session.seed.unwrap_or_else(rand::random);
    let learn = config.session.learn;

    let mut game = Game::new(config.game.clone(), seed)?;
    let space = game.action_space();
    tracing::info!(seed, actions = %space, grid = game.grid_size(), learn, "starting session");
    let mut agent = match &args.load {
        Some(path) => {
            let (agent, err) = checkpoint::load_or_fresh(path, &config.agent, space, seed.wrapping_add(1));
            if let Some(err) = err {
                println!("Could not load {}: {err}. Training a new agent.", path.display());
            }
            agent
        }
        None => QAgent::new(&config.agent, space.size(), seed.wrapping_add(1)),
    };
    if learn && args.reset_epsilon {
        agent.set_epsilon(config.agent.epsilon);
    }

    let history = args
        .history
        .as_deref()
        .map(History::open)
        .transpose()
        .context("failed to open history database")?;
    let run = db::run_id();

    let settings = SessionSettings {
        episodes: config.session.episodes,
        max_steps: config.session.max_steps,
        learn,
        show_vision: args.vision,
    };
    let summary = train::run_session(
        &mut game,
        &mut agent,
        &settings,
        history.as_ref().map(|h| (h, run.as_str())),
    )
    .context("session aborted")?;

    match &args.save {
        Some(path) if learn => {
            checkpoint::save(&agent, space, path).with_context(|| format!("failed to save {}", path.display()))?
        }
        Some(path) => tracing::info!(path = %path.display(), "play mode, value table not saved"),
        None => {}
    }

    println!(
        "Episodes: {} | Reward mean {:.2} max {:.2} min {:.2} | Best length: {} | Goals: {} | Slowest: {:.2} ms | States: {} | Epsilon: {:.4}",
        summary.episodes,
        summary.rewards.mean,
        summary.rewards.max,
        summary.rewards.min,
        summary.best_length,
        summary.goals_reached,
        summary.slowest.as_secs_f64() * 1000.0,
        agent.table().len(),
        agent.epsilon(),
    );
    if let Some(history) = &history {
        println!("History run id: {run} ({} runs stored)", history.runs()?.len());
        if let Some(best) = history.best(&run)? {
            println!(
                "Best episode: {} | Reward {:.2} | Steps {} | Max length {}",
                best.episode, best.reward, best.steps, best.max_length
            );
        }
    }
    Ok(())
}
