//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - configuration rejected by the schema
pub const VALIDATION_ERROR: i32 = 2;

/// Operation error - the cluster or the adapter reported an error
pub const OPERATION_ERROR: i32 = 3;

/// Config error - unknown type, unreadable CRDs or provider configuration
pub const CONFIG_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
