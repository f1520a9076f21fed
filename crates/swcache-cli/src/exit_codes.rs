//! Process exit codes for `swcache`. These are part of the CLI contract.

use swcache_core::CacheError;

pub const SUCCESS: i32 = 0;
pub const INVALID_INPUT: i32 = 1; // Bad config, URL, header or message
pub const INTERNAL_ERROR: i32 = 2; // Anything not raised by the worker
pub const NOT_INTERCEPTED: i32 = 3; // fetch: request left to the network
pub const NETWORK_ERROR: i32 = 5;
pub const CACHE_ERROR: i32 = 6;
pub const LIFECYCLE_ERROR: i32 = 7; // Out-of-order lifecycle event or host failure

/// Exit code for a failed command.
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CacheError>() {
        Some(e) => e.exit_code(),
        None => INTERNAL_ERROR,
    }
}
