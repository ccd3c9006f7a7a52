//! Exit codes for sb-cli.
//! These codes are part of the public contract; scripts rely on them.

pub const SUCCESS: i32 = 0;
pub const SUBMISSION_FAILED: i32 = 1; // At least one prediction was not accepted
pub const CONFIG_ERROR: i32 = 2; // Bad input file, failed validation or client setup
