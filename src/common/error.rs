use std::fmt;

use thiserror::Error;

/// 单条链接解码失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no decoder accepts link scheme")]
    UnsupportedScheme,

    #[error("invalid base64 payload: {0}")]
    Base64(String),

    #[error("missing separator '{0}'")]
    MissingSeparator(char),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("malformed uri: {0}")]
    Uri(String),
}

/// Reason a node failed validation. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    MissingServer,
    InvalidPort,
    MissingPassword,
    MissingCipher,
    MissingProtocolOrObfs,
    MissingIdentifier,
    InvalidAlterId,
}

impl ValidationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationReason::MissingServer => "missing-server",
            ValidationReason::InvalidPort => "invalid-port",
            ValidationReason::MissingPassword => "missing-password",
            ValidationReason::MissingCipher => "missing-cipher",
            ValidationReason::MissingProtocolOrObfs => "missing-protocol-or-obfs",
            ValidationReason::MissingIdentifier => "missing-identifier",
            ValidationReason::InvalidAlterId => "invalid-alter-id",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("node '{node}' failed validation: {reason}")]
pub struct ValidationError {
    pub node: String,
    pub reason: ValidationReason,
}

/// One failed line of a `line` subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFailure {
    /// 1-based line number in the decoded payload
    pub line: usize,
    pub link: String,
    pub error: DecodeError,
}

/// Aggregate of every per-link failure in one batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct BatchDecodeError {
    pub failures: Vec<LinkFailure>,
}

impl BatchDecodeError {
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BatchDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} link(s) failed to decode", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; line {}: {}", failure.line, failure.error)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error("empty subscription content")]
    EmptyContent,

    #[error("unrecognized subscription format: {0}")]
    UnknownFormat(String),

    #[error("malformed subscription document: {0}")]
    Document(#[from] serde_yml::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleConfigError {
    #[error("line {line}: {reason}")]
    Syntax { line: usize, reason: String },
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("unknown target dialect: {0}")]
    UnknownTarget(String),

    #[error("{dialect} does not support {protocol} node '{node}'")]
    UnsupportedProtocol {
        dialect: &'static str,
        protocol: &'static str,
        node: String,
    },

    #[error("failed to serialize {dialect} document: {reason}")]
    Serialize { dialect: &'static str, reason: String },
}
