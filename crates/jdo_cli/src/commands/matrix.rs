//! Matrix command implementation.

use super::{error_kind, sample_class};
use jdo_core::{
    ControllerCall, Operation, RecordingController, StateType, TransactionOptions,
    TransitionRequest,
};
use serde::Serialize;

/// Outcome of one operation applied to one state.
#[derive(Debug, Serialize)]
pub struct Cell {
    /// Starting state.
    pub from: StateType,
    /// Applied operation.
    pub operation: Operation,
    /// Resulting state, when the transition succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<StateType>,
    /// Error message, when it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Controller calls the transition made.
    pub calls: Vec<ControllerCall>,
}

/// Full matrix with the options it was computed under.
#[derive(Debug, Serialize)]
pub struct MatrixResult {
    /// Transaction options.
    pub options: TransactionOptions,
    /// Whether the transaction was active.
    pub active: bool,
    /// One cell per state and operation.
    pub cells: Vec<Cell>,
}

/// Computes every cell of the matrix.
pub fn compute(
    options: TransactionOptions,
    active: bool,
) -> Result<MatrixResult, Box<dyn std::error::Error>> {
    let class = sample_class()?;
    let mut cells = Vec::with_capacity(StateType::ALL.len() * Operation::ALL.len());

    for from in StateType::ALL {
        for operation in Operation::ALL {
            let mut ctl = RecordingController::with_options(class.clone(), options, active);
            let tx = ctl.transaction_handle();
            let request = TransitionRequest::with_defaults(operation, options.detach_all_on_commit);
            let outcome = from.state().apply(&mut ctl, tx.as_ref(), &request);
            let (to, error) = match outcome {
                Ok(next) => (Some(next.state_type()), None),
                Err(err) => (None, Some(error_kind(&err).to_string())),
            };
            cells.push(Cell {
                from,
                operation,
                to,
                error,
                calls: ctl.take_calls(),
            });
        }
    }

    Ok(MatrixResult {
        options,
        active,
        cells,
    })
}

/// Runs the matrix command.
pub fn run(
    options: TransactionOptions,
    active: bool,
    show_calls: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = compute(options, active)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result, show_calls),
    }

    Ok(())
}

fn print_text_output(result: &MatrixResult, show_calls: bool) {
    println!(
        "Transaction: {} ({})",
        if result.active { "active" } else { "inactive" },
        if result.options.optimistic {
            "optimistic"
        } else {
            "pessimistic"
        }
    );

    let mut previous = None;
    for cell in &result.cells {
        if previous != Some(cell.from) {
            println!();
            println!("{}", cell.from.code());
            previous = Some(cell.from);
        }
        let outcome = match (&cell.to, &cell.error) {
            (Some(to), _) => to.code().to_string(),
            (None, Some(error)) => format!("error: {error}"),
            (None, None) => String::new(),
        };
        if show_calls && !cell.calls.is_empty() {
            let calls: Vec<String> = cell.calls.iter().map(ToString::to_string).collect();
            println!(
                "  {:<22} -> {:<18} [{}]",
                cell.operation.as_str(),
                outcome,
                calls.join(", ")
            );
        } else {
            println!("  {:<22} -> {}", cell.operation.as_str(), outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(result: &MatrixResult, from: StateType, operation: Operation) -> &Cell {
        result
            .cells
            .iter()
            .find(|c| c.from == from && c.operation == operation)
            .unwrap()
    }

    #[test]
    fn covers_every_state_and_operation() {
        let result = compute(TransactionOptions::default(), true).unwrap();
        assert_eq!(result.cells.len(), 13 * 16);
    }

    #[test]
    fn hollow_commit_is_illegal() {
        let result = compute(TransactionOptions::default(), true).unwrap();
        let commit = cell(&result, StateType::Hollow, Operation::Commit);
        assert_eq!(commit.error.as_deref(), Some("illegal"));
        assert!(commit.calls.is_empty());
    }

    #[test]
    fn inactive_read_depends_on_nontransactional_read() {
        let closed = compute(TransactionOptions::default(), false).unwrap();
        let read = cell(&closed, StateType::PersistentClean, Operation::ReadField);
        assert_eq!(read.error.as_deref(), Some("not readable"));

        let open = compute(TransactionOptions::default().nontransactional_read(true), false)
            .unwrap();
        let read = cell(&open, StateType::PersistentClean, Operation::ReadField);
        assert_eq!(read.to, Some(StateType::PersistentClean));
    }

    #[test]
    fn json_names_states_by_code() {
        let result = compute(TransactionOptions::default(), true).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["cells"][0]["from"], "TRANSIENT");
        assert_eq!(json["cells"][0]["operation"], "make-persistent");
    }
}
