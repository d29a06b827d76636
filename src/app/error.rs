use thiserror::Error;

/// Failures surfaced to the user while resolving or talking to an app.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("App name or id is empty")]
    EmptyTarget,

    #[error("You need to pass localhost to connect to the local Lightning App.")]
    LocalhostOnly,

    #[error("The commands weren't found. Is your app {0} running ?")]
    CommandsNotFound(String),

    #[error("The application is starting. Try in a few moments.")]
    AppStarting,

    #[error("No valid projects found. Please reach out to the Lightning team to create a project.")]
    NoProject,

    #[error("No API key found. Set LIGHTNING_API_KEY or log in to create ~/.lightning/credentials.json")]
    MissingCredentials,

    #[error("The server didn't process the request properly. Found status {status} from {url}")]
    BadStatus { url: String, status: u16 },
}
