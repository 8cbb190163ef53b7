//! Simulate command implementation.
//!
//! Steps are applied to a single sample object managed by a [`Session`]
//! over an in-memory datastore. Accepted steps:
//!
//! - `begin`, `commit`, `rollback`: transaction boundaries
//! - `persist`: make a new sample object persistent (or, once it exists,
//!   call make-persistent on it)
//! - `find`: store a row and manage it as a hollow instance
//! - `read:<field>`, `write:<field>=<value>`
//! - `retrieve-all`: retrieve every field, not just the fetch plan
//! - any other operation name (`delete-persistent`, `evict`, `detach`, ...)

use super::{error_kind, sample_class};
use jdo_core::{
    ClassMetadata, Datastore, FieldValue, LifecycleError, LifecycleResult, ObjectId, Operation,
    Session, StateManager, StateType, TransactionOptions,
};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Why a step failed.
#[derive(Debug, Error)]
pub enum StepError {
    /// An object step ran before `persist` or `find`.
    #[error("no sample object yet; start with persist or find")]
    NoObject,

    /// The lifecycle engine refused the step.
    #[error("{kind}: {0}", kind = error_kind(.0))]
    Lifecycle(#[from] LifecycleError),
}

/// One parsed simulation step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Begin a transaction.
    Begin,
    /// Commit the transaction.
    Commit,
    /// Roll the transaction back.
    Rollback,
    /// Create and persist the sample object.
    Persist,
    /// Store a row and find it.
    Find,
    /// Read a field by name.
    Read(String),
    /// Write a field by name.
    Write(String, FieldValue),
    /// Retrieve every field.
    RetrieveAll,
    /// Any other lifecycle operation with default arguments.
    Apply(Operation),
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(field) = s.strip_prefix("read:") {
            return Ok(Step::Read(field.to_string()));
        }
        if let Some(rest) = s.strip_prefix("write:") {
            let (field, value) = rest
                .split_once('=')
                .ok_or_else(|| format!("expected write:<field>=<value>, got {s:?}"))?;
            return Ok(Step::Write(field.to_string(), parse_value(value)));
        }

        match s {
            "persist" => Ok(Step::Persist),
            "find" => Ok(Step::Find),
            "retrieve-all" => Ok(Step::RetrieveAll),
            _ => match s.parse::<Operation>() {
                Ok(Operation::Begin) => Ok(Step::Begin),
                Ok(Operation::Commit) => Ok(Step::Commit),
                Ok(Operation::Rollback) => Ok(Step::Rollback),
                Ok(Operation::ReadField | Operation::WriteField) => {
                    Err(format!("{s:?} needs a field, use read:<field> or write:<field>=<value>"))
                }
                Ok(op) => Ok(Step::Apply(op)),
                Err(e) => Err(e.to_string()),
            },
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Begin => f.write_str("begin"),
            Step::Commit => f.write_str("commit"),
            Step::Rollback => f.write_str("rollback"),
            Step::Persist => f.write_str("persist"),
            Step::Find => f.write_str("find"),
            Step::Read(field) => write!(f, "read:{field}"),
            Step::Write(field, value) => write!(f, "write:{field}={value:?}"),
            Step::RetrieveAll => f.write_str("retrieve-all"),
            Step::Apply(op) => f.write_str(op.as_str()),
        }
    }
}

fn parse_value(raw: &str) -> FieldValue {
    match raw {
        "null" => FieldValue::Null,
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(FieldValue::Integer)
            .unwrap_or_else(|_| FieldValue::from(raw)),
    }
}

/// Result of one step.
#[derive(Debug, Serialize)]
pub struct StepReport {
    /// The step as given.
    pub step: String,
    /// State of the sample object afterwards, once it exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StateType>,
    /// Value returned by a read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
    /// Error raised by the step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A session and the sample object it manages.
pub struct Simulation {
    session: Session,
    class: Arc<ClassMetadata>,
    object: Option<ObjectId>,
    next_key: i64,
}

impl Simulation {
    /// Creates a simulation, beginning a transaction when `active`.
    pub fn new(options: TransactionOptions, active: bool) -> LifecycleResult<Self> {
        let mut session = Session::in_memory(options);
        if active {
            session.begin()?;
        }
        Ok(Self {
            session,
            class: Arc::new(sample_class()?),
            object: None,
            next_key: 1,
        })
    }

    /// Current state of the sample object.
    pub fn state(&self) -> Option<StateType> {
        self.object.and_then(|id| self.session.state_of(id).ok())
    }

    /// Runs one step, returning the value of a read.
    pub fn step(&mut self, step: &Step) -> Result<Option<FieldValue>, StepError> {
        match step {
            Step::Begin | Step::Apply(Operation::Begin) => {
                self.session.begin()?;
            }
            Step::Commit | Step::Apply(Operation::Commit) => {
                self.session.commit()?;
            }
            Step::Rollback | Step::Apply(Operation::Rollback) => {
                self.session.rollback()?;
            }
            Step::Persist => match self.object {
                Some(id) => {
                    self.session.object_mut(id)?.make_persistent()?;
                }
                None => {
                    let values = self.sample_values();
                    self.object = Some(self.session.persist(&self.class, values)?);
                }
            },
            Step::Find => {
                let id = ObjectId::new();
                let values = self.sample_values();
                self.session.store().insert(id, values)?;
                self.object = Some(self.session.find(&self.class, id)?);
            }
            Step::Read(field) => return Ok(Some(self.object()?.read_field_named(field)?)),
            Step::Write(field, value) => {
                self.object()?.write_field_named(field, value.clone())?;
            }
            Step::RetrieveAll => {
                self.object()?.retrieve(false)?;
            }
            Step::Apply(op) => {
                let sm = self.object()?;
                match op {
                    Operation::MakePersistent => sm.make_persistent()?,
                    Operation::DeletePersistent => sm.delete_persistent()?,
                    Operation::MakeTransactional => sm.make_transactional(false)?,
                    Operation::MakeNontransactional => sm.make_nontransactional()?,
                    Operation::MakeTransient => sm.make_transient(false)?,
                    Operation::Refresh => sm.refresh()?,
                    Operation::Evict => sm.evict()?,
                    Operation::Retrieve => sm.retrieve(true)?,
                    Operation::Detach => sm.detach()?,
                    Operation::Attach => sm.attach()?,
                    Operation::Serialize => sm.serialize()?,
                    Operation::ReadField | Operation::WriteField => {
                        let class = sm.class().name();
                        return Err(LifecycleError::unknown_field(class, "<none>").into());
                    }
                    Operation::Begin | Operation::Commit | Operation::Rollback => sm.state_type(),
                };
            }
        }
        Ok(None)
    }

    fn object(&mut self) -> Result<&mut StateManager, StepError> {
        let id = self.object.ok_or(StepError::NoObject)?;
        Ok(self.session.object_mut(id)?)
    }

    fn sample_values(&mut self) -> Vec<FieldValue> {
        let key = self.next_key;
        self.next_key += 1;
        vec![
            FieldValue::Integer(key),
            format!("person-{key}").into(),
            format!("person-{key}@example.com").into(),
            FieldValue::Null,
        ]
    }
}

/// Runs the simulate command.
pub fn run(
    ops: &[String],
    options: TransactionOptions,
    active: bool,
    keep_going: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let steps = ops
        .iter()
        .map(|op| op.parse::<Step>())
        .collect::<Result<Vec<_>, _>>()?;

    let (reports, failed) = simulate(&steps, options, active, keep_going)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&reports)?),
        _ => print_text_output(&reports),
    }

    if failed && !keep_going {
        return Err("simulation stopped at the first failing step".into());
    }
    Ok(())
}

/// Applies `steps` in order. Returns the reports and whether a step failed.
pub fn simulate(
    steps: &[Step],
    options: TransactionOptions,
    active: bool,
    keep_going: bool,
) -> LifecycleResult<(Vec<StepReport>, bool)> {
    let mut sim = Simulation::new(options, active)?;
    let mut reports = Vec::with_capacity(steps.len());
    let mut failed = false;

    for step in steps {
        let outcome = sim.step(step);
        debug!(step = %step, ok = outcome.is_ok(), "simulated step");
        let (value, error) = match outcome {
            Ok(value) => (value, None),
            Err(err) => {
                failed = true;
                (None, Some(err.to_string()))
            }
        };
        reports.push(StepReport {
            step: step.to_string(),
            state: sim.state(),
            value,
            error,
        });
        if failed && !keep_going {
            break;
        }
    }

    Ok((reports, failed))
}

fn print_text_output(reports: &[StepReport]) {
    for (i, report) in reports.iter().enumerate() {
        let state = report.state.map_or("-", StateType::code);
        print!("{:>3}. {:<28} {:<17}", i + 1, report.step, state);
        if let Some(value) = &report.value {
            print!(" = {value:?}");
        }
        if let Some(error) = &report.error {
            print!(" ! {error}");
        }
        println!();
    }
}
