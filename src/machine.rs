//! This module defines the `Machine` struct, the generic execution engine.
//! It couples an immutable [`Program`] with a live configuration (state,
//! tape, head, step count), and resolves actions, including delegation to
//! submachines that operate on the same tape.

use std::collections::HashSet;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::registry::Registry;
use crate::tape::Tape;
use crate::types::{Action, MachineError, Outcome, Program, Step, Write};

/// A cooperative cancellation token checked once per `run` iteration,
/// always at a step boundary and never mid-step.
///
/// Clone it freely: clones share the same flag, so a host can hand one clone
/// to a worker thread running the machine and keep another to signal a stop.
/// The token is the only state meant to cross threads while a run is in
/// progress.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop. The machine honors it before its next step.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether a stop has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// A read-only view of the machine's configuration.
///
/// Handed to observers after the write and state update of a step but
/// before its move or delegation, and returned by
/// [`observe`](Machine::observe) between steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current state label.
    pub state: String,
    /// Full tape contents.
    pub tape: String,
    /// Head position within `tape`.
    pub head: usize,
    /// Steps executed so far, including the one being observed.
    pub steps: usize,
}

type Observer = Box<dyn FnMut(&Snapshot) + Send>;

/// The table-driven execution engine.
///
/// A machine exclusively owns its configuration; the program (and its
/// transition table) is shared and immutable, so many machines may run the
/// same program concurrently as long as each has its own tape.
pub struct Machine {
    state: String,
    tape: Tape,
    step_count: usize,
    program: Arc<Program>,
    registry: Arc<Registry>,
    observer: Option<Observer>,
}

impl Machine {
    /// Creates a machine from a program, with an empty shared registry.
    pub fn new(program: Program) -> Self {
        Self::with_registry(program, Arc::new(Registry::new()))
    }

    /// Creates a machine from a program and a shared submachine registry.
    pub fn with_registry(program: Program, registry: Arc<Registry>) -> Self {
        Self::from_shared(Arc::new(program), registry)
    }

    /// Creates a machine from an already-shared program. Tables are
    /// reference-shared, never copied per machine.
    pub fn from_shared(program: Arc<Program>, registry: Arc<Registry>) -> Self {
        Self {
            state: program.initial_state.clone(),
            tape: Tape::new(&program.tape, program.blank),
            step_count: 0,
            program,
            registry,
            observer: None,
        }
    }

    /// Executes exactly one transition.
    ///
    /// Order within a step: read, lookup, write, state update, observer
    /// notification, action. On an undefined transition the configuration is
    /// left untouched.
    pub fn step(&mut self) -> Step {
        self.step_with(None)
    }

    fn step_with(&mut self, cancel: Option<&CancelToken>) -> Step {
        let symbol = self.tape.read();

        let transition = match self.program.rules.lookup(&self.state, symbol) {
            Some(t) => t.clone(),
            None => {
                return Step::Halt(MachineError::UndefinedTransition(
                    self.state.clone(),
                    symbol,
                ))
            }
        };

        if let Write::Put(s) = transition.write {
            self.tape.write(s);
        }
        self.state = transition.next;
        self.step_count += 1;

        // Observers see the write and the state update, but not yet the
        // move or delegation. This ordering is part of the contract.
        self.notify();

        match transition.action {
            Action::Left => self.tape.move_left(),
            Action::Right => self.tape.move_right(),
            Action::Stay => {}
            Action::Call(token) => return self.delegate(&token, cancel),
        }

        Step::Continue
    }

    /// Runs until the machine reaches a final state or gets stuck.
    pub fn run(&mut self) -> Outcome {
        self.run_inner(None)
    }

    /// Runs until the machine reaches a final state, gets stuck, or `cancel`
    /// signals a stop. Cancellation is observed only before a step begins,
    /// so the tape is always left in a last-completed-step state.
    pub fn run_with(&mut self, cancel: &CancelToken) -> Outcome {
        self.run_inner(Some(cancel))
    }

    fn run_inner(&mut self, cancel: Option<&CancelToken>) -> Outcome {
        loop {
            if self.is_accepted() {
                return Outcome::Completed;
            }
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Outcome::Cancelled;
            }

            match self.step_with(cancel) {
                Step::Continue => {}
                Step::Cancelled => return Outcome::Cancelled,
                Step::Halt(error) => return Outcome::Halted(error),
            }
        }
    }

    /// Resolves `token` and runs the submachine on this machine's tape.
    ///
    /// The tape moves into the delegate and back; it is never copied, which
    /// is what lets the delegate continue exactly where the caller left off.
    /// The delegate always starts in its own initial state. Whatever it
    /// wrote stays on the tape even when it fails: there is no rollback.
    fn delegate(&mut self, token: &str, cancel: Option<&CancelToken>) -> Step {
        let program = match self
            .program
            .submachines
            .get(token)
            .or_else(|| self.registry.get(token))
        {
            Some(p) => Arc::clone(p),
            None => return Step::Halt(MachineError::MissingSubmachine(token.to_string())),
        };

        let mut sub = Machine::from_shared(program, Arc::clone(&self.registry));
        sub.tape = mem::replace(&mut self.tape, Tape::new("", self.program.blank));
        sub.observer = self.observer.take();

        let outcome = sub.run_inner(cancel);

        self.observer = sub.observer.take();
        self.tape = sub.tape;

        match outcome {
            Outcome::Completed => Step::Continue,
            Outcome::Cancelled => Step::Cancelled,
            Outcome::Halted(error) => Step::Halt(error),
        }
    }

    /// Installs a post-write, pre-move observer invoked once per step,
    /// including the steps of any submachine this machine delegates to.
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&Snapshot) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    /// Removes the installed observer, if any.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    fn notify(&mut self) {
        if self.observer.is_some() {
            let snapshot = self.observe();
            if let Some(observer) = self.observer.as_mut() {
                observer(&snapshot);
            }
        }
    }

    /// Returns a read-only snapshot of the current configuration. Safe to
    /// call between steps.
    pub fn observe(&self) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            tape: self.tape.contents(),
            head: self.tape.head(),
            steps: self.step_count,
        }
    }

    /// Whether the current state is one of the program's final states.
    pub fn is_accepted(&self) -> bool {
        self.program.is_final(&self.state)
    }

    /// Current state label.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// The state this machine starts in.
    pub fn initial_state(&self) -> &str {
        &self.program.initial_state
    }

    /// The tape.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Total number of steps executed, not counting delegate steps.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// The program this machine runs.
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// Replaces the tape contents and rewinds the head, leaving state and
    /// step count alone.
    pub fn set_tape_content(&mut self, content: &str) {
        self.tape.set_content(content);
    }

    /// Restores the initial configuration: initial state, initial tape,
    /// head on cell 0, step count zero.
    pub fn reset(&mut self) {
        self.state = self.program.initial_state.clone();
        self.tape = Tape::new(&self.program.tape, self.program.blank);
        self.step_count = 0;
    }

    /// Structural validation of a program: non-empty rule set and at least
    /// one final state.
    pub fn validate_program(program: &Program) -> Result<(), MachineError> {
        if program.final_states.is_empty() {
            return Err(MachineError::ValidationError(format!(
                "program '{}' declares no final states",
                program.name
            )));
        }

        if program.rules.is_empty() {
            return Err(MachineError::ValidationError(format!(
                "program '{}' has no rules",
                program.name
            )));
        }

        Ok(())
    }

    /// Checks that every `Call` token in the program resolves against the
    /// local bindings or the shared registry. Unresolvable tokens are a
    /// configuration defect better caught before a run than during one.
    pub fn validate(&self) -> Result<(), MachineError> {
        Self::validate_program(&self.program)?;

        let tokens: HashSet<String> = self
            .program
            .rules
            .rules()
            .into_iter()
            .filter_map(|rule| match rule.action {
                Action::Call(token) => Some(token),
                _ => None,
            })
            .collect();

        for token in tokens {
            if !self.program.submachines.contains_key(&token) && !self.registry.contains(&token) {
                return Err(MachineError::MissingSubmachine(token));
            }
        }

        Ok(())
    }
}
