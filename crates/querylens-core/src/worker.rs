//! Runs parsing and AST walks on a thread with a known stack size.
//!
//! sqlparser and the resolver recurse once per nesting level, and a frame
//! can be large in unoptimized builds. The caller's stack size is unknown
//! (async runtimes commonly use 2 MiB worker threads), so every analysis
//! runs on its own thread sized for [`PARSER_RECURSION_LIMIT`] levels.
//! Stack overflow aborts the process and cannot be caught; a panic can.
//!
//! [`PARSER_RECURSION_LIMIT`]: crate::parser::PARSER_RECURSION_LIMIT

use std::any::Any;
use std::thread;

use crate::error::LineageError;

/// Stack reserved for one analysis thread.
pub const ANALYSIS_STACK_SIZE: usize = 64 * 1024 * 1024;

const THREAD_NAME: &str = "querylens-analysis";

/// Runs `work` on a dedicated thread with [`ANALYSIS_STACK_SIZE`] of stack.
///
/// A panic inside `work` is returned as [`LineageError::Panicked`].
pub(crate) fn run_isolated<T, F>(work: F) -> Result<T, LineageError>
where
    F: FnOnce() -> Result<T, LineageError> + Send,
    T: Send,
{
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .stack_size(ANALYSIS_STACK_SIZE)
            .spawn_scoped(scope, work)
            .map_err(|err| LineageError::WorkerUnavailable(err.to_string()))?;
        handle
            .join()
            .unwrap_or_else(|payload| Err(LineageError::Panicked(panic_message(payload.as_ref()))))
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
