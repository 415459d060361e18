//! Error types for the `domain` layer.
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use esp_client::{Error as EspClientError, ErrorKind as EspClientErrorKind};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. The intent is to translate errors between layers while maintaining
/// layer boundaries. Ex. `domain` is dependent on `entity_api` and `esp-client`, and `web`
/// is dependent on `domain`, but `web` should not be dependent, directly, on either of them.
/// Ultimately the various `error_kind`s are used by `web` to return appropriate HTTP status
/// codes and messages to the client.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    /// Caller supplied input that can never succeed: unsupported provider,
    /// malformed key, missing data-center.
    Validation(String),
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Other(String),
}

/// Enum representing the various kinds of entity errors that can bubble up from the "Entity" layer (`entity_api` and `entity`).
/// These errors are translated from the `entity_api` layer to the `domain` layer and reduced to a subset of error kinds
/// that are relevant to the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Conflict,
    Invalid,
    DbTransaction,
}

/// Enum representing the failures reported by an email-service-provider.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    /// Upstream rejected the stored or submitted credentials.
    Unauthenticated(String),
    /// Upstream resource (e.g. a list id) does not exist.
    NotFound(String),
    RateLimited,
    Timeout,
    ServiceUnavailable,
    Provider { status: u16, message: String },
    Other(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Validation(message.into()),
        }
    }

    pub fn not_found() -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::NotFound,
            )),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let entity_error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            EntityApiErrorKind::RecordConflict => EntityErrorKind::Conflict,
            EntityApiErrorKind::RecordNotUpdated => EntityErrorKind::Invalid,
            EntityApiErrorKind::SystemError => EntityErrorKind::DbTransaction,
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

// And here from the `esp-client` layer. Factory failures are caller mistakes,
// everything an adapter reports is external.
impl From<EspClientError> for Error {
    fn from(err: EspClientError) -> Self {
        let message = err.message();
        let error_kind = match &err.error_kind {
            EspClientErrorKind::Unauthorized => {
                DomainErrorKind::External(ExternalErrorKind::Unauthenticated(message))
            }
            EspClientErrorKind::NotFound => {
                DomainErrorKind::External(ExternalErrorKind::NotFound(message))
            }
            EspClientErrorKind::RateLimited => {
                DomainErrorKind::External(ExternalErrorKind::RateLimited)
            }
            EspClientErrorKind::Timeout => DomainErrorKind::External(ExternalErrorKind::Timeout),
            EspClientErrorKind::ServiceUnavailable => {
                DomainErrorKind::External(ExternalErrorKind::ServiceUnavailable)
            }
            EspClientErrorKind::Provider { status, .. } => {
                DomainErrorKind::External(ExternalErrorKind::Provider {
                    status: *status,
                    message,
                })
            }
            EspClientErrorKind::UnsupportedProvider(_)
            | EspClientErrorKind::InvalidKeyFormat
            | EspClientErrorKind::MissingRegion => DomainErrorKind::Validation(message),
            EspClientErrorKind::ClientBuild => {
                DomainErrorKind::Internal(InternalErrorKind::Other(message))
            }
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}
