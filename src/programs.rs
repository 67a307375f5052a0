//! Built-in arithmetic programs.
//!
//! These are the reusable automata the engine composes into a calculator:
//! binary increment and decrement, a carry-marker binary adder, and an
//! initiator that positions the head and delegates the whole addition to
//! the adder. Tables are built as typed rule lists; there is no table
//! source syntax to parse.

use std::collections::HashMap;
use std::sync::Arc;

use crate::registry::Registry;
use crate::types::{Action, MachineError, Program, Rule, TransitionTable};

/// Blank symbol shared by the built-in binary arithmetic programs.
pub const BLANK: char = ' ';

lazy_static::lazy_static! {
    /// The built-in programs, constructed once and shared read-only.
    pub static ref PROGRAMS: Vec<Arc<Program>> = {
        let mut programs = Vec::new();

        for result in [increment(), decrement(), addition(), calculator()] {
            match result {
                Ok(program) => programs.push(Arc::new(program)),
                Err(e) => eprintln!("failed to build built-in program: {e}"),
            }
        }

        programs
    };
}

/// Looks up a built-in program by name.
pub fn builtin(name: &str) -> Option<Arc<Program>> {
    PROGRAMS.iter().find(|p| p.name == name).cloned()
}

/// The token bindings the composed programs expect, as an explicit registry
/// value: `"I"` increment, `"D"` decrement, `"S"` the adder.
pub fn standard_registry() -> Result<Registry, MachineError> {
    let mut registry = Registry::new();
    registry.register("I", Arc::new(increment()?));
    registry.register("D", Arc::new(decrement()?));
    registry.register("S", Arc::new(addition()?));
    Ok(registry)
}

fn assemble(
    name: &str,
    initial_state: &str,
    final_state: &str,
    tape: &str,
    rules: Vec<Rule>,
) -> Result<Program, MachineError> {
    Ok(Program {
        name: name.to_string(),
        initial_state: initial_state.to_string(),
        final_states: vec![final_state.to_string()],
        tape: tape.to_string(),
        blank: BLANK,
        rules: TransitionTable::new(rules)?,
        submachines: HashMap::new(),
    })
}

/// Binary increment: adds one to the blank-terminated number on the tape.
///
/// Scans right to the end of the number, then walks back flipping trailing
/// ones to zeros until a zero (or the left edge) absorbs the carry.
/// `"111 "` becomes `1000`.
pub fn increment() -> Result<Program, MachineError> {
    let rules = vec![
        Rule::keep("s0", '0', Action::Right, "s0"),
        Rule::keep("s0", '1', Action::Right, "s0"),
        Rule::keep("s0", BLANK, Action::Left, "s1"),
        Rule::put("s1", '0', '1', Action::Stay, "s2"),
        Rule::put("s1", '1', '0', Action::Left, "s3"),
        Rule::keep("s3", '0', Action::Stay, "s1"),
        Rule::keep("s3", '1', Action::Stay, "s1"),
        Rule::put("s3", BLANK, '1', Action::Left, "s2"),
    ];

    assemble("Binary increment", "s0", "s2", "111 ", rules)
}

/// Binary decrement: subtracts one from the blank-terminated number.
///
/// Walks back from the end turning trailing zeros into ones until a one
/// absorbs the borrow. `"10 "` becomes `01`.
pub fn decrement() -> Result<Program, MachineError> {
    let rules = vec![
        Rule::keep("s0", '0', Action::Right, "s0"),
        Rule::keep("s0", '1', Action::Right, "s0"),
        Rule::keep("s0", BLANK, Action::Left, "s1"),
        Rule::put("s1", '0', '1', Action::Left, "s1"),
        Rule::put("s1", '1', '0', Action::Stay, "s2"),
        Rule::keep("s1", BLANK, Action::Stay, "s2"),
    ];

    assemble("Binary decrement", "s0", "s2", "10 ", rules)
}

/// Carry-marker binary adder for tapes of the form `A+B` followed by a
/// blank, `=`, or `=$` terminator.
///
/// Consumes B bit by bit from the right, marking each as scratch `c`, and
/// folds it into A using the markers `O` (sum bit 0) and `I` (sum bit 1)
/// with explicit carry propagation. The final sweep erases `+`, converts
/// markers back to digits, and accepts in `s10` with the sum in the
/// leftmost region.
pub fn addition() -> Result<Program, MachineError> {
    let rules = vec![
        // Find the right end of the input.
        Rule::keep("s0", '0', Action::Right, "s0"),
        Rule::keep("s0", '1', Action::Right, "s0"),
        Rule::keep("s0", '+', Action::Right, "s0"),
        Rule::keep("s0", BLANK, Action::Left, "s1"),
        Rule::keep("s0", '=', Action::Left, "s1"),
        // Consume B's rightmost unprocessed bit.
        Rule::put("s1", '0', 'c', Action::Left, "s2"),
        Rule::put("s1", '1', 'c', Action::Left, "s5"),
        Rule::put("s1", '+', BLANK, Action::Left, "s9"),
        // B bit was 0: find A and record a sum bit without carry.
        Rule::keep("s2", '0', Action::Left, "s2"),
        Rule::keep("s2", '1', Action::Left, "s2"),
        Rule::keep("s2", '+', Action::Left, "s3"),
        Rule::keep("s3", 'O', Action::Left, "s3"),
        Rule::keep("s3", 'I', Action::Left, "s3"),
        Rule::put("s3", '0', 'O', Action::Right, "s4"),
        Rule::put("s3", BLANK, 'O', Action::Right, "s4"),
        Rule::put("s3", '1', 'I', Action::Right, "s4"),
        Rule::keep("s4", '0', Action::Right, "s4"),
        Rule::keep("s4", '1', Action::Right, "s4"),
        Rule::keep("s4", 'O', Action::Right, "s4"),
        Rule::keep("s4", 'I', Action::Right, "s4"),
        Rule::keep("s4", '+', Action::Right, "s4"),
        Rule::put("s4", 'c', '0', Action::Left, "s1"),
        // B bit was 1: add it into A, carrying as needed.
        Rule::keep("s5", '0', Action::Left, "s5"),
        Rule::keep("s5", '1', Action::Left, "s5"),
        Rule::keep("s5", '+', Action::Left, "s6"),
        Rule::keep("s6", 'O', Action::Left, "s6"),
        Rule::keep("s6", 'I', Action::Left, "s6"),
        Rule::put("s6", '1', 'O', Action::Left, "s7"),
        Rule::put("s6", '0', 'I', Action::Right, "s8"),
        Rule::put("s6", BLANK, 'I', Action::Right, "s8"),
        Rule::put("s7", '1', '0', Action::Left, "s7"),
        Rule::put("s7", '0', '1', Action::Right, "s8"),
        Rule::put("s7", BLANK, '1', Action::Right, "s8"),
        Rule::keep("s8", '0', Action::Right, "s8"),
        Rule::keep("s8", '1', Action::Right, "s8"),
        Rule::keep("s8", 'O', Action::Right, "s8"),
        Rule::keep("s8", 'I', Action::Right, "s8"),
        Rule::keep("s8", '+', Action::Right, "s8"),
        Rule::put("s8", 'c', '1', Action::Left, "s1"),
        // B exhausted: convert markers back to digits and finish.
        Rule::keep("s9", '0', Action::Left, "s9"),
        Rule::keep("s9", '1', Action::Left, "s9"),
        Rule::put("s9", 'I', '1', Action::Left, "s9"),
        Rule::put("s9", 'O', '0', Action::Left, "s9"),
        Rule::keep("s9", BLANK, Action::Right, "s10"),
    ];

    assemble("Binary addition", "s0", "s10", "111+101 ", rules)
}

/// The composed calculator: positions the head on the first digit, then
/// delegates the whole addition to the adder bound to token `"S"`.
///
/// This is the delegation showcase: the adder runs on the calculator's own
/// tape and the calculator resumes in its final state at whatever position
/// the adder left the head.
pub fn calculator() -> Result<Program, MachineError> {
    let rules = vec![
        Rule::keep("s0", '1', Action::Right, "s0"),
        Rule::keep("s0", '0', Action::Right, "s0"),
        Rule::keep("s0", '+', Action::Left, "s1"),
        Rule::keep("s1", '1', Action::Left, "s1"),
        Rule::keep("s1", '0', Action::Left, "s1"),
        Rule::keep("s1", BLANK, Action::Right, "s2"),
        Rule::keep("s2", '1', Action::Call("S".to_string()), "s3"),
        Rule::keep("s2", '0', Action::Call("S".to_string()), "s3"),
    ];

    Ok(assemble("Calculator", "s0", "s3", "111+101", rules)?
        .with_submachine("S", Arc::new(addition()?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Machine;
    use crate::types::{MachineError, Outcome};

    fn run_on(program: Program, tape: &str) -> Machine {
        let mut machine = Machine::new(program);
        machine.set_tape_content(tape);
        assert_eq!(machine.run(), Outcome::Completed);
        machine
    }

    fn result_region(machine: &Machine) -> String {
        machine
            .tape()
            .trimmed()
            .split(BLANK)
            .next()
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_increment_seven() {
        // 111 + 1 = 1000
        let machine = run_on(increment().unwrap(), "111 ");
        assert_eq!(machine.tape().trimmed(), "1000");
    }

    #[test]
    fn test_increment_with_trailing_zero() {
        // 110 + 1 = 111
        let machine = run_on(increment().unwrap(), "110 ");
        assert_eq!(machine.tape().trimmed(), "111");
    }

    #[test]
    fn test_decrement_two() {
        // 10 - 1 = 01
        let machine = run_on(decrement().unwrap(), "10 ");
        assert_eq!(machine.tape().trimmed(), "01");
    }

    #[test]
    fn test_decrement_four() {
        // 100 - 1 = 011
        let machine = run_on(decrement().unwrap(), "100 ");
        assert_eq!(machine.tape().trimmed(), "011");
    }

    #[test]
    fn test_addition_five_plus_three() {
        // 101 + 11 = 1000, with '=' and '$' terminators on the tape
        let machine = run_on(addition().unwrap(), "101+11=$");
        assert_eq!(result_region(&machine), "1000");
    }

    #[test]
    fn test_addition_one_plus_one() {
        // 1 + 1 = 10
        let machine = run_on(addition().unwrap(), "1+1=$");
        assert_eq!(result_region(&machine), "10");
    }

    #[test]
    fn test_addition_blank_terminated() {
        // 111 + 101 = 1100
        let machine = run_on(addition().unwrap(), "111+101 ");
        assert_eq!(result_region(&machine), "1100");
    }

    #[test]
    fn test_calculator_delegates_to_adder() {
        let machine = run_on(calculator().unwrap(), "111+101");

        assert_eq!(machine.state(), "s3");
        assert_eq!(result_region(&machine), "1100");
    }

    #[test]
    fn test_calculator_without_binding_reports_missing_submachine() {
        let mut program = calculator().unwrap();
        program.submachines.clear();

        let mut machine = Machine::new(program);
        assert!(matches!(
            machine.run(),
            Outcome::Halted(MachineError::MissingSubmachine(token)) if token == "S"
        ));
    }

    #[test]
    fn test_all_builtins_are_valid() {
        assert_eq!(PROGRAMS.len(), 4);

        for program in PROGRAMS.iter() {
            assert!(
                Machine::validate_program(program).is_ok(),
                "program '{}' is invalid",
                program.name
            );
        }
    }

    #[test]
    fn test_builtins_run_to_completion_on_their_own_tapes() {
        for program in PROGRAMS.iter() {
            let mut machine = Machine::new(program.as_ref().clone());
            assert_eq!(
                machine.run(),
                Outcome::Completed,
                "program '{}' did not complete",
                program.name
            );
        }
    }

    #[test]
    fn test_builtin_lookup_by_name() {
        assert!(builtin("Binary increment").is_some());
        assert!(builtin("Calculator").is_some());
        assert!(builtin("Nonexistent").is_none());
    }

    #[test]
    fn test_program_serialization_round_trip() {
        let program = increment().unwrap();

        let json = serde_json::to_string(&program).unwrap();
        let decoded: Program = serde_json::from_str(&json).unwrap();

        assert_eq!(program, decoded);
    }

    #[test]
    fn test_standard_registry_tokens() {
        let registry = standard_registry().unwrap();

        assert!(registry.contains("I"));
        assert!(registry.contains("D"));
        assert!(registry.contains("S"));
        assert_eq!(registry.get("S").unwrap().name, "Binary addition");
    }

    #[test]
    fn test_calculator_resolves_adder_from_shared_registry() {
        // Same composition as the built-in calculator, but wired through
        // the shared registry instead of a local binding.
        let mut program = calculator().unwrap();
        program.submachines.clear();

        let registry = standard_registry().unwrap().into_shared();
        let mut machine = Machine::with_registry(program, registry);

        assert_eq!(machine.run(), Outcome::Completed);
        assert_eq!(result_region(&machine), "1100");
    }
}
