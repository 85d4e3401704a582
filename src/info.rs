//! Helpers for manipulating info lines returned by the modem.
//!
//! Info lines for a command are generally prefixed with the command
//! identifier and a colon, e.g. `+CSQ: 14,99` in response to `AT+CSQ`.
//! Higher layers use these helpers to select and strip that prefix before
//! interpreting the remainder.

/// Returns true if the line begins with the info prefix for the command.
pub fn has_prefix(line: &str, cmd: &str) -> bool {
    line.strip_prefix(cmd)
        .is_some_and(|rest| rest.starts_with(':'))
}

/// Removes the command prefix, if any, and any intervening spaces from the
/// info line.
pub fn trim_prefix<'a>(line: &'a str, cmd: &str) -> &'a str {
    let rest = match line.strip_prefix(cmd) {
        Some(rest) if rest.starts_with(':') => &rest[1..],
        _ => line,
    };
    rest.trim_start_matches(' ')
}
