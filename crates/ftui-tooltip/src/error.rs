#![forbid(unsafe_code)]

use core::fmt;

use crate::event::RequestId;
use crate::options::OptionsError;

/// Tooltip error type.
#[derive(Debug)]
pub enum TooltipError {
    /// Options failed validation or loading.
    Options(OptionsError),
    /// A fetch completion named a request this instance never issued, or
    /// one that already completed.
    UnknownRequest(RequestId),
}

impl fmt::Display for TooltipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Options(e) => write!(f, "invalid tooltip options: {e}"),
            Self::UnknownRequest(id) => write!(f, "no outstanding fetch for {id}"),
        }
    }
}

impl std::error::Error for TooltipError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Options(e) => Some(e),
            Self::UnknownRequest(_) => None,
        }
    }
}

impl From<OptionsError> for TooltipError {
    fn from(e: OptionsError) -> Self {
        Self::Options(e)
    }
}
