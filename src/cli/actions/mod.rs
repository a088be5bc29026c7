pub mod server;

// The `Action` match lives in its own module so this one stays declarative.
mod run;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
}

impl Action {
    // Call sites run `action.execute().await`; a new variant (e.g. `Migrate`)
    // gets its arm in `run::execute`.
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
