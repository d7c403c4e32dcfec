use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use laf_engine::{AuctionApiError, ItemApiError, SettlementApiError};
use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state. {0}")]
    Conflict(String),
    #[error("The checkout gateway could not be reached. {0}")]
    UpstreamError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
            },
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("This host is not authorized to call the webhook.")]
    ForbiddenPeer,
}

impl From<ItemApiError> for ServerError {
    fn from(e: ItemApiError) -> Self {
        match e {
            ItemApiError::ValidationError(_) => Self::InvalidRequestBody(e.to_string()),
            ItemApiError::ReportNotFound(_) | ItemApiError::ItemNotFound(_) => Self::NoRecordFound(e.to_string()),
            ItemApiError::Forbidden(_) => Self::InsufficientPermissions(e.to_string()),
            ItemApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<AuctionApiError> for ServerError {
    fn from(e: AuctionApiError) -> Self {
        match e {
            AuctionApiError::ValidationError(_) => Self::InvalidRequestBody(e.to_string()),
            AuctionApiError::AuctionNotFound(_) | AuctionApiError::ItemNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            AuctionApiError::AuctionAlreadyExists(_) |
            AuctionApiError::AuctionNotOpen(_) |
            AuctionApiError::BidTooLow { .. } => Self::Conflict(e.to_string()),
            AuctionApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<SettlementApiError> for ServerError {
    fn from(e: SettlementApiError) -> Self {
        match e {
            SettlementApiError::ValidationError(_) | SettlementApiError::AmountMismatch { .. } => {
                Self::InvalidRequestBody(e.to_string())
            },
            SettlementApiError::AuctionNotFound(_) | SettlementApiError::IntentNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            SettlementApiError::NoBids(_) | SettlementApiError::AlreadySettled { .. } => Self::Conflict(e.to_string()),
            SettlementApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Initialization(s) => Self::ConfigurationError(s),
            _ => Self::UpstreamError(e.to_string()),
        }
    }
}
