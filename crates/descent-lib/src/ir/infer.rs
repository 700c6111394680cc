//! Per-function inference passes: locals, SCAN eligibility, newline
//! injection, expected-terminator EOF behaviour, and the inline-emit
//! return fix-up.

use super::{walk_function_commands, Case, Command, Function, State};

/// Bytes eligible for one SIMD multi-byte search.
const SCAN_MAX: usize = 6;

/// Records every assigned variable as an `i32` local and hoists leading
/// entry-action literal assignments into declaration initialisers.
pub(super) fn infer_locals(func: &mut Function) {
    let mut assigned: Vec<String> = Vec::new();
    walk_function_commands(func, &mut |cmd| {
        if let Command::Assign { var, .. }
        | Command::AddAssign { var, .. }
        | Command::SubAssign { var, .. } = cmd
        {
            assigned.push(var.clone());
        }
    });
    for var in assigned {
        if !func.params.contains(&var) && !func.locals.contains_key(&var) {
            func.locals.insert(var, "i32".to_string());
        }
    }

    // declare-with-initialiser beats declare-then-assign in the output
    loop {
        let hoistable = match func.entry_actions.first() {
            Some(Command::Assign { var, expr }) => {
                expr.parse::<i64>().is_ok()
                    && func.locals.contains_key(var)
                    && !func.local_init_values.contains_key(var)
            }
            _ => false,
        };
        if !hoistable {
            break;
        }
        let Command::Assign { var, expr } = func.entry_actions.remove(0) else {
            unreachable!("peeked an assign");
        };
        func.local_init_values.insert(var, expr);
    }
}

/// Computes per-state flags: default/self-loop/unconditional markers,
/// SCAN eligibility, and newline injection.
pub(super) fn infer_state_flags(state: &mut State) {
    state.has_default = state.cases.iter().any(|c| c.is_default);
    state.is_unconditional = state.cases.first().is_some_and(|c| c.is_bare);
    state.is_self_looping = state.cases.iter().any(|c| {
        c.commands
            .iter()
            .any(|cmd| matches!(cmd, Command::Transition { target: None }))
    });

    state.scan_chars = scan_chars(&state.cases);
    if !state.scan_chars.is_empty()
        && state.scan_chars.len() < SCAN_MAX
        && !state.scan_chars.contains(&b'\n')
    {
        // SIMD scans must stop at newlines so line tracking stays exact
        state.scan_chars.insert(0, b'\n');
        state.newline_injected = true;
    }
}

/// A state qualifies for SCAN when its default case only advances and
/// self-loops, and the remaining cases match a small literal byte set.
fn scan_chars(cases: &[Case]) -> Vec<u8> {
    let Some(default) = cases.iter().find(|c| c.is_default) else {
        return Vec::new();
    };
    if default.commands.len() != 2
        || !default.commands.contains(&Command::Advance)
        || !default
            .commands
            .contains(&Command::Transition { target: None })
    {
        return Vec::new();
    }

    let mut bytes: Vec<u8> = Vec::new();
    for case in cases.iter().filter(|c| !c.is_default) {
        if case.condition.is_some() {
            continue;
        }
        if case.chars.is_empty() {
            // bare, param, or runtime-resolved selector: scanning would
            // skip bytes this case must see
            return Vec::new();
        }
        for &b in &case.chars {
            if !bytes.contains(&b) {
                bytes.push(b);
            }
        }
    }
    if bytes.is_empty() || bytes.len() > SCAN_MAX {
        return Vec::new();
    }
    bytes
}

/// Infers `expects_char` and `emits_content_on_close` from return-bearing
/// cases (spec: every such case must select the same single byte).
pub(super) fn infer_expects(func: &mut Function) {
    let mut expected: Option<u8> = None;
    let mut terminates_content = false;
    let mut uniform = true;

    'states: for state in &func.states {
        for case in &state.cases {
            let Some(return_at) = case
                .commands
                .iter()
                .position(|cmd| matches!(cmd, Command::Return { .. }))
            else {
                continue;
            };
            if !case.is_byte_selector() || case.chars.len() != 1 || case.class.is_some() {
                uniform = false;
                break 'states;
            }
            let byte = case.chars[0];
            match expected {
                None => expected = Some(byte),
                Some(prev) if prev == byte => {}
                Some(_) => {
                    uniform = false;
                    break 'states;
                }
            }
            if case.commands[..return_at]
                .iter()
                .any(|cmd| matches!(cmd, Command::Term { .. }))
            {
                terminates_content = true;
            }
        }
    }

    func.expects_char = if uniform { expected } else { None };
    func.emits_content_on_close = func.expects_char.is_some() && terminates_content;
}

/// A bare `return` after an inline emit must not auto-emit the function's
/// own event a second time.
pub(super) fn fixup_inline_returns(func: &mut Function) {
    for state in &mut func.states {
        for case in &mut state.cases {
            let mut emitted = false;
            for cmd in &mut case.commands {
                match cmd {
                    Command::InlineEmit { .. } => emitted = true,
                    Command::Return {
                        emit: None,
                        value: None,
                        suppress_auto_emit,
                    } if emitted => {
                        *suppress_auto_emit = true;
                    }
                    _ => {}
                }
            }
        }
    }
}
