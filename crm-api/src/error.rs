use actix_web::error::{JsonPayloadError, UrlencodedError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use shared_types::{ErrorResponse, ValidationErrors};
use thiserror::Error;

use crate::database::DbError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => ApiError::NotFound,
            DbError::InvalidReference { field, message } => {
                ApiError::Validation(ValidationErrors::single(&field, message))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(errors) => ErrorResponse::validation(errors.clone()),
            ApiError::NotFound => ErrorResponse::new("Not found"),
            ApiError::Unauthorized => ErrorResponse::new("Unauthorized"),
            ApiError::Internal(msg) => {
                tracing::error!("Request failed: {}", msg);
                ErrorResponse::new("Something went wrong")
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Field name used when a body does not fit the form's shape at all.
const BODY_FIELD: &str = "body";

/// A JSON body with a field of the wrong type is a validation failure, not a bad request.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::Deserialize(e) => {
            ApiError::Validation(ValidationErrors::single(BODY_FIELD, e.to_string())).into()
        }
        other => other.into(),
    }
}

pub fn form_error_handler(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        UrlencodedError::Parse(e) => {
            ApiError::Validation(ValidationErrors::single(BODY_FIELD, e.to_string())).into()
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_reference_error_becomes_field_error() {
        let err: ApiError = DbError::reference("company_id", "Company not found").into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "Validation failed");
        assert_eq!(
            parsed.fields.unwrap()["company_id"],
            vec!["Company not found".to_string()]
        );
    }

    #[actix_web::test]
    async fn test_store_errors_are_masked() {
        let err: ApiError =
            DbError::Sqlite(rusqlite::Error::InvalidQuery).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "Something went wrong");
        assert!(parsed.fields.is_none());
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err: ApiError = DbError::NotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_mistyped_json_field_is_a_validation_error() {
        let err = serde_json::from_str::<shared_types::MoveDealRequest>(
            r#"{"deal_id": "a", "stage_id": "b", "position": "2"}"#,
        )
        .unwrap_err();
        let req = actix_web::test::TestRequest::default().to_http_request();

        let response = json_error_handler(JsonPayloadError::Deserialize(err), &req).error_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(response.into_body()).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "Validation failed");
        assert!(parsed.fields.unwrap().contains_key("body"));
    }

    #[test]
    fn test_wrong_content_type_is_not_a_validation_error() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        let response = json_error_handler(JsonPayloadError::ContentType, &req).error_response();
        assert_ne!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
