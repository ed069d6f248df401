//! Exit codes following sysexits.h conventions.
//!
//! Semantic exit codes let scripts and CI systems distinguish "content not
//! registered" from "file missing" from "policy violation".

#![allow(dead_code)] // Constants may be used in future or for documentation

use imprint_core::ImprintError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (no registered match, corrupted content).
/// Maps to EX_DATAERR from sysexits.h.
pub const VERIFICATION_FAILED: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// I/O error (cannot write output file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Permission denied (requester is not the owner).
/// Maps to EX_NOPERM from sysexits.h.
pub const PERMISSION_ERROR: i32 = 77;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        // Classify by the core error first, message heuristics second.
        let code = if let Some(core) = err.downcast_ref::<ImprintError>() {
            match core {
                ImprintError::Unauthorized { .. } => PERMISSION_ERROR,
                ImprintError::NotFound(_) => VERIFICATION_FAILED,
                ImprintError::InvalidContent(_)
                | ImprintError::PayloadTooLarge { .. }
                | ImprintError::AlreadyRegistered { .. }
                | ImprintError::DuplicateIdentifier(_)
                | ImprintError::DimensionMismatch { .. } => USAGE_ERROR,
                ImprintError::Storage(_) => IO_ERROR,
            }
        } else if message.contains("Failed to read image") || message.contains("Failed to read registry") {
            INPUT_ERROR
        } else if message.contains("no registered match") || message.contains("no watermark") {
            VERIFICATION_FAILED
        } else if message.contains("Failed to write") || message.contains("Failed to save") {
            IO_ERROR
        } else {
            GENERAL_ERROR
        };

        Self {
            code,
            message: Some(message),
        }
    }
}
