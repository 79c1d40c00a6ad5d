use crate::auth::AuthConfig;

pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        auth: AuthConfig,
    },
}

impl Action {
    /// Run the selected action to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the action fails
    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Server { .. } => server::handle(self).await,
        }
    }
}
