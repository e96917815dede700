use std::fmt;

pub type Result<T> = core::result::Result<T, Error>;

pub struct Error {
    pub inner: Box<ErrorKind>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Error {
        Error {
            inner: Box::new(kind),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.inner
    }

    /// True when the request never reached the server or its reply was unusable.
    pub fn is_transport(&self) -> bool {
        match *self.inner {
            #[cfg(feature = "no-wasm")]
            ErrorKind::ReqwestError(_) => true,
            #[cfg(feature = "wasm")]
            ErrorKind::GlooNetError(_) => true,
            ErrorKind::SerdeJsonError(_) | ErrorKind::TimedOut => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.inner)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&*self.inner)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::new(kind)
    }
}

#[cfg(feature = "no-wasm")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        if e.is_timeout() {
            return Error::new(ErrorKind::TimedOut);
        }
        Error::new(ErrorKind::ReqwestError(e))
    }
}

#[cfg(feature = "wasm")]
impl From<gloo_net::Error> for Error {
    fn from(e: gloo_net::Error) -> Error {
        Error::new(ErrorKind::GlooNetError(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::new(ErrorKind::SerdeJsonError(e))
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Error {
        Error::new(ErrorKind::UrlError(e))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Error {
        Error::new(ErrorKind::ConfigError(e.to_string()))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::new(ErrorKind::StdIoError(e))
    }
}

/// Which of the two credentials a request needs was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Csrf,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access token"),
            TokenKind::Csrf => f.write_str("CSRF token"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[cfg(feature = "no-wasm")]
    #[error("ReqwestError: {0}")]
    ReqwestError(#[source] reqwest::Error),
    #[cfg(feature = "wasm")]
    #[error("GlooNetError: {0}")]
    GlooNetError(#[source] gloo_net::Error),
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[source] serde_json::Error),
    #[error("UrlError: {0}")]
    UrlError(#[source] url::ParseError),
    #[error("StdIoError: {0}")]
    StdIoError(#[source] std::io::Error),
    #[error("ConfigError: {0}")]
    ConfigError(String),
    #[error("{0} is not available yet")]
    TokenUnavailable(TokenKind),
    #[error("InvalidHeader: {0}")]
    InvalidHeader(String),
    #[error("join request timed out")]
    TimedOut,
    #[error("join request was cancelled")]
    Cancelled,
    #[error("success response is not a token record: {0}")]
    MalformedTokenRecord(String),
}
