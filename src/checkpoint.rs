//! Saving and loading the value table with the agent's scalars.
//!
//! Two formats, picked by file extension:
//! - flat text (default): `#`-prefixed header lines, then one line per
//!   state, `W,s,G,w 0 1.5 -3.25 0`
//! - JSON (`.json`): metadata plus a list of rows

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::ActionSpace;
use crate::agent::QAgent;
use crate::config::AgentConfig;
use crate::error::CheckpointError;
use crate::table::ValueTable;
use crate::vision::StateKey;

pub const FORMAT_VERSION: u32 = 1;
const MAGIC: &str = "snake_qlearn";

/// Everything restored from a checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub action_space: ActionSpace,
    pub alpha: f32,
    pub gamma: f32,
    pub epsilon: f32,
    pub table: ValueTable,
}

impl Snapshot {
    /// Agent continuing from this snapshot. Exploration schedule comes from
    /// `config`; alpha, gamma and epsilon from the file.
    pub fn into_agent(self, config: &AgentConfig, seed: u64) -> QAgent {
        let mut agent = QAgent::with_table(config, self.table, seed);
        agent.set_rates(self.alpha, self.gamma);
        agent.set_epsilon(self.epsilon);
        agent
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CheckpointMeta {
    pub version: u32,
    pub action_space: String,
    pub alpha: f32,
    pub gamma: f32,
    pub epsilon: f32,
    pub states: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CheckpointRow {
    pub key: String,
    pub values: Vec<f32>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CheckpointFile {
    pub meta: CheckpointMeta,
    pub table: Vec<CheckpointRow>,
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub fn save(agent: &QAgent, space: ActionSpace, path: &Path) -> Result<(), CheckpointError> {
    let io = |source: std::io::Error| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io)?;
    }
    let content = if is_json(path) {
        serde_json::to_string_pretty(&to_file(agent, space))?
    } else {
        encode_text(agent, space)
    };
    fs::write(path, content).map_err(io)?;
    tracing::info!(path = %path.display(), states = agent.table().len(), "saved value table");
    Ok(())
}

pub fn load(path: &Path, expected: ActionSpace) -> Result<Snapshot, CheckpointError> {
    let content = fs::read_to_string(path).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if is_json(path) {
        let file: CheckpointFile = serde_json::from_str(&content)?;
        from_file(file, expected)
    } else {
        decode_text(&content, expected)
    }
}

/// Loads `path`, or falls back to a fresh agent. The load error, if any, is
/// handed back so the caller can report it.
pub fn load_or_fresh(
    path: &Path,
    config: &AgentConfig,
    space: ActionSpace,
    seed: u64,
) -> (QAgent, Option<CheckpointError>) {
    match load(path, space) {
        Ok(snapshot) => {
            tracing::info!(
                path = %path.display(),
                states = snapshot.table.len(),
                alpha = snapshot.alpha,
                gamma = snapshot.gamma,
                epsilon = snapshot.epsilon,
                "loaded value table"
            );
            (snapshot.into_agent(config, seed), None)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not load value table, starting fresh");
            (QAgent::new(config, space.size(), seed), Some(err))
        }
    }
}

pub fn encode_text(agent: &QAgent, space: ActionSpace) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {MAGIC} v{FORMAT_VERSION}\n"));
    out.push_str(&format!("# actions {}\n", space.name()));
    out.push_str(&format!("# alpha {}\n", agent.alpha()));
    out.push_str(&format!("# gamma {}\n", agent.gamma()));
    out.push_str(&format!("# epsilon {}\n", agent.epsilon()));
    for (key, values) in agent.table().sorted() {
        out.push_str(&key.to_string());
        for v in values {
            out.push_str(&format!(" {v}"));
        }
        out.push('\n');
    }
    out
}

pub fn decode_text(content: &str, expected: ActionSpace) -> Result<Snapshot, CheckpointError> {
    let mut version = None;
    let mut space = None;
    let (mut alpha, mut gamma, mut epsilon) = (None, None, None);
    let mut rows = Vec::new();

    for (i, raw) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = |reason: String| CheckpointError::Malformed { line: line_no, reason };

        if let Some(header) = line.strip_prefix('#') {
            let mut parts = header.split_whitespace();
            let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(malformed(format!("bad header `{line}`")));
            };
            let scalar = |v: &str| v.parse::<f32>().map_err(|e| malformed(format!("{name}: {e}")));
            match name {
                MAGIC => version = Some(value.to_string()),
                "actions" => space = Some(value.to_string()),
                "alpha" => alpha = Some(scalar(value)?),
                "gamma" => gamma = Some(scalar(value)?),
                "epsilon" => epsilon = Some(scalar(value)?),
                other => return Err(malformed(format!("unknown header `{other}`"))),
            }
            continue;
        }

        let mut fields = line.split_whitespace();
        let key_text = fields.next().unwrap_or_default();
        let key: StateKey = key_text.parse().map_err(malformed)?;
        let values = fields
            .map(|f| f.parse::<f32>().map_err(|e| malformed(format!("value `{f}`: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push((key, values));
    }

    let expected_version = format!("v{FORMAT_VERSION}");
    match version {
        Some(v) if v == expected_version => {}
        found => {
            return Err(CheckpointError::Version {
                found: found.unwrap_or_else(|| "none".to_string()),
                expected: FORMAT_VERSION,
            });
        }
    }
    let missing = |what: &str| CheckpointError::Malformed {
        line: 0,
        reason: format!("missing `{what}` header"),
    };
    let space = check_space(&space.ok_or_else(|| missing("actions"))?, expected)?;

    let mut table = ValueTable::new(space.size());
    for (key, values) in rows {
        insert_row(&mut table, key, values)?;
    }
    Ok(Snapshot {
        action_space: space,
        alpha: alpha.ok_or_else(|| missing("alpha"))?,
        gamma: gamma.ok_or_else(|| missing("gamma"))?,
        epsilon: epsilon.ok_or_else(|| missing("epsilon"))?,
        table,
    })
}

pub fn to_file(agent: &QAgent, space: ActionSpace) -> CheckpointFile {
    CheckpointFile {
        meta: CheckpointMeta {
            version: FORMAT_VERSION,
            action_space: space.name().to_string(),
            alpha: agent.alpha(),
            gamma: agent.gamma(),
            epsilon: agent.epsilon(),
            states: agent.table().len(),
        },
        table: agent
            .table()
            .sorted()
            .into_iter()
            .map(|(key, values)| CheckpointRow {
                key: key.to_string(),
                values: values.to_vec(),
            })
            .collect(),
    }
}

pub fn from_file(file: CheckpointFile, expected: ActionSpace) -> Result<Snapshot, CheckpointError> {
    if file.meta.version != FORMAT_VERSION {
        return Err(CheckpointError::Version {
            found: file.meta.version.to_string(),
            expected: FORMAT_VERSION,
        });
    }
    let space = check_space(&file.meta.action_space, expected)?;
    let mut table = ValueTable::new(space.size());
    for (i, row) in file.table.into_iter().enumerate() {
        let key: StateKey = row.key.parse().map_err(|reason| CheckpointError::Malformed { line: i + 1, reason })?;
        insert_row(&mut table, key, row.values)?;
    }
    Ok(Snapshot {
        action_space: space,
        alpha: file.meta.alpha,
        gamma: file.meta.gamma,
        epsilon: file.meta.epsilon,
        table,
    })
}

fn check_space(found: &str, expected: ActionSpace) -> Result<ActionSpace, CheckpointError> {
    match ActionSpace::from_name(found) {
        Some(space) if space == expected => Ok(space),
        _ => Err(CheckpointError::ActionSpace {
            found: found.to_string(),
            expected: expected.name().to_string(),
        }),
    }
}

fn insert_row(table: &mut ValueTable, key: StateKey, values: Vec<f32>) -> Result<(), CheckpointError> {
    let found = values.len();
    if !table.insert(key, values) {
        return Err(CheckpointError::RowWidth {
            key: key.to_string(),
            found,
            expected: table.actions(),
        });
    }
    Ok(())
}
