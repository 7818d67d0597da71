//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                        |
//! |------|------------------------------------------------|
//! | 0    | Success                                        |
//! | 1    | General error (config, layout file, I/O)       |
//! | 2    | Usage error (bad args, unknown label/binding)  |
//! | 3    | Validation found input errors                  |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unreadable config or layout, bad layout tree.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown picker label or sort binding.
pub const EXIT_USAGE: u8 = 2;

/// `validate` ran and the rows have errors. Like `diff(1)`, the command
/// itself succeeded; the exit code reports the finding.
pub const EXIT_VALIDATION: u8 = 3;
