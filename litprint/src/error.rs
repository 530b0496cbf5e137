use lit_diagnostics::ThemeError;

/// Errors returned to callers of the debugger API
#[derive(Debug, thiserror::Error)]
pub enum LitError {
    #[error("configure() needs at least one override")]
    NothingToConfigure,

    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error("failed to load settings: {0}")]
    Settings(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LitError>;
