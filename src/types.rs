//! This module defines the core data structures shared across the engine:
//! transition rules and tables, programs, execution outcomes, and error types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;

/// The write effect of a transition.
///
/// The original formulation reserved a magic symbol for "leave the cell
/// alone"; here the no-write case is a first-class variant, so every symbol
/// in the alphabet remains writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Write {
    /// Leave the symbol under the head untouched.
    Keep,
    /// Replace the symbol under the head.
    Put(char),
}

/// The action a transition applies after its write effect.
///
/// Exactly one action per transition: a physical head move, a stay, or a
/// delegation to the submachine registered under the given token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Move the head one cell to the left.
    Left,
    /// Move the head one cell to the right.
    Right,
    /// Keep the head in place.
    Stay,
    /// Hand the tape and head position to another machine and resume once it
    /// completes. The token is resolved against the program's local bindings
    /// first, then the shared [`Registry`](crate::registry::Registry).
    Call(String),
}

/// A single transition rule in its flat, buildable form.
///
/// `Rule` is the construction and serialization format of a table; the
/// engine itself consults the indexed [`TransitionTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// State this rule applies in.
    pub state: String,
    /// Symbol that must be under the head.
    pub read: char,
    /// Write effect applied before the action.
    pub write: Write,
    /// Head move, stay, or submachine call.
    pub action: Action,
    /// State the machine transitions to.
    pub next: String,
}

impl Rule {
    /// A rule that leaves the cell untouched.
    pub fn keep(state: &str, read: char, action: Action, next: &str) -> Self {
        Self {
            state: state.to_string(),
            read,
            write: Write::Keep,
            action,
            next: next.to_string(),
        }
    }

    /// A rule that replaces the symbol under the head with `symbol`.
    pub fn put(state: &str, read: char, symbol: char, action: Action, next: &str) -> Self {
        Self {
            state: state.to_string(),
            read,
            write: Write::Put(symbol),
            action,
            next: next.to_string(),
        }
    }
}

/// The (state, symbol) product type a table is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateSymbol {
    pub state: String,
    pub symbol: char,
}

/// Borrowed view of a table key. Lets `lookup` query the map with a
/// `(&str, char)` pair instead of building an owned `StateSymbol` on every
/// step. Hashes field by field, matching `StateSymbol`'s derived `Hash`.
trait LookupKey {
    fn state(&self) -> &str;
    fn symbol(&self) -> char;
}

impl LookupKey for StateSymbol {
    fn state(&self) -> &str {
        &self.state
    }

    fn symbol(&self) -> char {
        self.symbol
    }
}

impl<'a> LookupKey for (&'a str, char) {
    fn state(&self) -> &str {
        self.0
    }

    fn symbol(&self) -> char {
        self.1
    }
}

impl<'a> Borrow<dyn LookupKey + 'a> for StateSymbol {
    fn borrow(&self) -> &(dyn LookupKey + 'a) {
        self
    }
}

impl Hash for dyn LookupKey + '_ {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.state().hash(hasher);
        self.symbol().hash(hasher);
    }
}

impl PartialEq for dyn LookupKey + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.state() == other.state() && self.symbol() == other.symbol()
    }
}

impl Eq for dyn LookupKey + '_ {}

/// The outcome half of a rule: what to write, where to go, what to do next.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub write: Write,
    pub action: Action,
    pub next: String,
}

/// A finite partial mapping from (state, symbol) to a [`Transition`].
///
/// Absence of a key is a legal, meaningful value: it is the undefined-halt
/// signal, not a malformed table. Duplicate keys are rejected at
/// construction rather than resolved last-write-wins.
///
/// Tables serialize as their sorted rule list and are re-validated on
/// deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Rule>", into = "Vec<Rule>")]
pub struct TransitionTable {
    entries: HashMap<StateSymbol, Transition>,
}

impl TransitionTable {
    /// Builds a table from a list of rules.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::DuplicateRule`] if two rules share the same
    /// (state, symbol) key.
    pub fn new(rules: Vec<Rule>) -> Result<Self, MachineError> {
        let mut entries = HashMap::with_capacity(rules.len());

        for rule in rules {
            let key = StateSymbol {
                state: rule.state,
                symbol: rule.read,
            };
            let transition = Transition {
                write: rule.write,
                action: rule.action,
                next: rule.next,
            };

            if entries.insert(key.clone(), transition).is_some() {
                return Err(MachineError::DuplicateRule(key.state, key.symbol));
            }
        }

        Ok(Self { entries })
    }

    /// Looks up the transition for `(state, symbol)`, if one is defined.
    /// Allocation-free: the pair is borrowed as a [`LookupKey`].
    pub fn lookup(&self, state: &str, symbol: char) -> Option<&Transition> {
        self.entries.get(&(state, symbol) as &dyn LookupKey)
    }

    /// Returns the rules of this table, sorted by state then symbol.
    pub fn rules(&self) -> Vec<Rule> {
        let mut rules: Vec<Rule> = self
            .entries
            .iter()
            .map(|(key, transition)| Rule {
                state: key.state.clone(),
                read: key.symbol,
                write: transition.write,
                action: transition.action.clone(),
                next: transition.next.clone(),
            })
            .collect();

        rules.sort_by(|a, b| (&a.state, a.read).cmp(&(&b.state, b.read)));
        rules
    }

    /// Number of rules in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no rules at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Vec<Rule>> for TransitionTable {
    type Error = MachineError;

    fn try_from(rules: Vec<Rule>) -> Result<Self, Self::Error> {
        Self::new(rules)
    }
}

impl From<TransitionTable> for Vec<Rule> {
    fn from(table: TransitionTable) -> Self {
        table.rules()
    }
}

/// A complete machine definition: table, start and final states, initial
/// tape, blank symbol, and optional local submachine bindings.
///
/// Programs are pure data. One generic [`Machine`](crate::machine::Machine)
/// runs any of them; "increment", "adder" and so on are distinct `Program`
/// values, not distinct types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Human-readable program name.
    pub name: String,
    /// The state the machine starts in (and resets to when delegated to).
    pub initial_state: String,
    /// Accepting states. Reaching any of these completes a run.
    pub final_states: Vec<String>,
    /// Initial tape contents.
    pub tape: String,
    /// The blank symbol used to pad the tape. There is no universal default;
    /// each program declares its own.
    pub blank: char,
    /// The transition rules driving the machine.
    pub rules: TransitionTable,
    /// Local token bindings, consulted before the shared registry. These are
    /// wiring, not data, and are skipped during serialization.
    #[serde(skip)]
    pub submachines: HashMap<String, Arc<Program>>,
}

impl Program {
    /// Whether `state` is one of the program's accepting states.
    pub fn is_final(&self, state: &str) -> bool {
        self.final_states.iter().any(|s| s == state)
    }

    /// Binds `token` to a submachine, consulted before the shared registry.
    pub fn with_submachine(mut self, token: &str, program: Arc<Program>) -> Self {
        self.submachines.insert(token.to_string(), program);
        self
    }
}

/// The result of a single [`step`](crate::machine::Machine::step).
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The machine applied a transition and can continue.
    Continue,
    /// The machine stopped: no rule applies, or a delegation failed.
    Halt(MachineError),
    /// A delegated run observed a cancellation signal before finishing.
    /// Only reachable through [`run_with`](crate::machine::Machine::run_with).
    Cancelled,
}

/// The terminal status of a [`run`](crate::machine::Machine::run).
///
/// The three-way distinction is part of the public contract: callers must be
/// able to tell success from a stuck machine from an external stop.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The machine reached one of its final states.
    Completed,
    /// The cancellation token signalled a stop at a step boundary.
    Cancelled,
    /// The machine got stuck: undefined transition, missing submachine, or a
    /// delegate that itself halted.
    Halted(MachineError),
}

/// Errors surfaced by table construction, validation, and execution.
///
/// Execution errors are terminal statuses, not exceptions: they travel
/// through [`Step`] and [`Outcome`] return values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    /// No rule is defined for the current (state, symbol) pair.
    #[error("no rule defined for state {0} and symbol {1:?}")]
    UndefinedTransition(String, char),
    /// A `Call` token resolved to nothing in either registry.
    #[error("no submachine registered for token {0:?}")]
    MissingSubmachine(String),
    /// Two rules share the same (state, symbol) key.
    #[error("duplicate rule for state {0} and symbol {1:?}")]
    DuplicateRule(String, char),
    /// A program failed structural validation.
    #[error("program validation error: {0}")]
    ValidationError(String),
}
