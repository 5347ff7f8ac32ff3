use thiserror::Error;

use crate::api::ApiError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Rejected before any remote call was made.
    #[error("{0}")]
    Validation(String),
    /// Refused locally because a prior call already reported the viewer
    /// lacks messaging privileges.
    #[error("messaging privileges required")]
    AccessDenied,
}

impl Error {
    pub fn is_access_denied(&self) -> bool {
        match self {
            Error::AccessDenied => true,
            Error::Api(err) => err.is_permission_denied(),
            Error::Validation(_) => false,
        }
    }
}
