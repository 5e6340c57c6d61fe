use std::future::Future;
use std::io;

use tokio::task::JoinHandle;

/// Spawn a background task under `name`. With `tokio_unstable` the name is
/// visible to tokio-console; otherwise it is attached as a tracing span.
pub fn spawn_named_task<F, S>(name: S, future: F) -> io::Result<JoinHandle<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
    S: Into<String>,
{
    let name = name.into();
    #[cfg(tokio_unstable)]
    {
        tokio::task::Builder::new().name(&name).spawn(future)
    }
    #[cfg(not(tokio_unstable))]
    {
        use tracing::Instrument;
        let span = tracing::debug_span!("task", task_name = %name);
        Ok(tokio::spawn(future.instrument(span)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn named_task_runs_to_completion() {
        let handle = spawn_named_task("adder", async { 2 + 2 }).unwrap();
        assert_eq!(handle.await.unwrap(), 4);
    }
}
