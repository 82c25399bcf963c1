use wst_core::link::TransportError;
use wst_core::control_loop::InitError;
use wst_core::parameters::ParameterError;

/// Errors raised by the host harness.
#[derive(Debug, thiserror::Error)]
pub enum SitlError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Parameter error: {0}")]
    Parameter(ParameterError),

    #[error("Setup failed: {0}")]
    Setup(&'static str),

    #[error("Startup failed: {0}")]
    Init(InitError),

    #[error("Transport error: {0}")]
    Transport(TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ParameterError> for SitlError {
    fn from(e: ParameterError) -> Self {
        SitlError::Parameter(e)
    }
}

impl From<InitError> for SitlError {
    fn from(e: InitError) -> Self {
        SitlError::Init(e)
    }
}

impl From<TransportError> for SitlError {
    fn from(e: TransportError) -> Self {
        SitlError::Transport(e)
    }
}
