//! States command implementation.

use jdo_core::StateType;
use serde::Serialize;

/// One row of the state table.
#[derive(Debug, Serialize)]
pub struct StateRow {
    /// State code.
    pub state: StateType,
    /// Persistent flag.
    pub persistent: bool,
    /// Transactional flag.
    pub transactional: bool,
    /// Dirty flag.
    pub dirty: bool,
    /// New flag.
    pub new: bool,
    /// Deleted flag.
    pub deleted: bool,
}

impl From<StateType> for StateRow {
    fn from(state_type: StateType) -> Self {
        let state = state_type.state();
        Self {
            state: state_type,
            persistent: state.is_persistent(),
            transactional: state.is_transactional(),
            dirty: state.is_dirty(),
            new: state.is_new(),
            deleted: state.is_deleted(),
        }
    }
}

/// Runs the states command.
pub fn run(format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let rows: Vec<StateRow> = StateType::ALL.into_iter().map(StateRow::from).collect();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        _ => print_text_output(&rows),
    }

    Ok(())
}

fn print_text_output(rows: &[StateRow]) {
    println!(
        "{:<17} {:>10} {:>13} {:>5} {:>3} {:>7}",
        "STATE", "persistent", "transactional", "dirty", "new", "deleted"
    );
    for row in rows {
        println!(
            "{:<17} {:>10} {:>13} {:>5} {:>3} {:>7}",
            row.state.code(),
            mark(row.persistent),
            mark(row.transactional),
            mark(row.dirty),
            mark(row.new),
            mark(row.deleted)
        );
    }
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "x"
    } else {
        "-"
    }
}
