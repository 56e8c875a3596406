//! CLI Exit Code Registry
//!
//! Single source of truth for `effcalc` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                   |
//! |------|-------------------------------------------|
//! | 0    | Success                                   |
//! | 1    | General error (terminal I/O, output)      |
//! | 2    | Usage error (bad arguments)               |
//! | 3    | Interactive mode needs a terminal         |
//!
//! Projection itself never fails: non-numeric inputs are coerced, not
//! rejected, so there is no "invalid input" code.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - output could not be written, terminal setup failed.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments.
pub const EXIT_USAGE: u8 = 2;

/// `effcalc tui` run without an interactive terminal.
pub const EXIT_NO_TTY: u8 = 3;
