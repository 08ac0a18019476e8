use std::future::Future;

use tokio::runtime::Handle;

use crate::error::StrataError;

/// Runs the future in the background on the current tokio runtime.
///
/// Fails without running the future if called outside of a runtime context.
pub fn spawn<T>(future: T) -> Result<(), StrataError>
where
    T: Future + Send + 'static,
    T::Output: Send + 'static,
{
    let handle = Handle::try_current()
        .map_err(|err| StrataError::Generic(format!("cannot start background task: {err}")))?;
    handle.spawn(future);

    Ok(())
}
