// ========================= Exit codes =========================
//
// Process exit codes for the `paperfile` binary.

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// Failure that carries no `PaperError` (argument parsing, logger setup)
pub const EXIT_ERROR: i32 = 1;

/// Missing, ambiguous, empty or badly named input
pub const EXIT_INPUT_ERROR: i32 = 2;

/// Data does not fit the grid, or the grid itself is degenerate
pub const EXIT_CAPACITY_ERROR: i32 = 3;

/// Symbol stream, frame or compressed payload could not be read back
pub const EXIT_FORMAT_ERROR: i32 = 4;

/// Image could not be loaded or saved
pub const EXIT_IMAGE_ERROR: i32 = 5;

/// Corner selection was abandoned
pub const EXIT_CANCELLED: i32 = 6;

/// Invalid configuration or command-line values
pub const EXIT_INVALID_ARGS: i32 = 7;

/// Other file-system failure
pub const EXIT_IO_ERROR: i32 = 8;
