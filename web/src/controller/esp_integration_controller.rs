//! Controller for email-service-provider integrations.
//!
//! Keys are validated against the provider before they are stored and are
//! never part of any response.

use crate::controller::ApiResponse;
use crate::params::esp_integration::{CreateParams, IntegrationListsResponse, ProviderFilter};
use crate::{AppState, Error};

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use domain::error::Error as DomainError;
use domain::esp_integration::{self, Outcome};
use domain::esp_integrations::Model;
use domain::{Id, MailingList, ValidationResult};
use log::*;

fn parse_id(id: &str) -> Result<Id, Error> {
    Id::parse_str(id).map_err(|_| DomainError::validation(format!("Invalid integration id: {id}")).into())
}

fn provider_filter(
    filter: core::result::Result<Query<ProviderFilter>, QueryRejection>,
) -> Result<ProviderFilter, Error> {
    let Query(filter) = filter.map_err(|e| DomainError::validation(e.body_text()))?;
    Ok(filter)
}

/// POST connect an ESP account
///
/// Validates the key with the provider and stores it as that provider's
/// active integration, replacing previous credentials.
#[utoipa::path(
    post,
    path = "/integrations/esp",
    request_body = CreateParams,
    responses(
        (status = 201, description = "Integration created", body = Model),
        (status = 200, description = "Existing integration updated", body = Model),
        (status = 400, description = "Unsupported provider or malformed API key"),
        (status = 401, description = "Provider rejected the API key"),
        (status = 409, description = "Concurrent write for the same provider"),
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    params: core::result::Result<Json<CreateParams>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(params) = params.map_err(|e| DomainError::validation(e.body_text()))?;
    debug!("POST connect {} integration", params.provider);

    let (integration, outcome) = esp_integration::create_or_update(
        app_state.db_conn_ref(),
        &app_state.config,
        &params.provider,
        &params.api_key,
    )
    .await?;

    let status = match outcome {
        Outcome::Created => StatusCode::CREATED,
        Outcome::Updated => StatusCode::OK,
    };
    Ok((status, Json(ApiResponse::new(integration))))
}

/// GET all active integrations
#[utoipa::path(
    get,
    path = "/integrations/esp",
    params(ProviderFilter),
    responses(
        (status = 200, description = "Active integrations, without API keys", body = [Model]),
        (status = 400, description = "Unsupported provider filter"),
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    filter: core::result::Result<Query<ProviderFilter>, QueryRejection>,
) -> Result<impl IntoResponse, Error> {
    let filter = provider_filter(filter)?;
    let integrations =
        esp_integration::find_active(app_state.db_conn_ref(), filter.provider.as_deref()).await?;

    Ok(Json(ApiResponse::new(integrations)))
}

/// GET mailing lists of every active integration
///
/// A failing provider does not fail the request; its entry carries an error
/// instead of lists.
#[utoipa::path(
    get,
    path = "/integrations/esp/lists",
    params(ProviderFilter),
    responses(
        (status = 200, description = "Lists grouped by integration", body = [IntegrationListsResponse]),
        (status = 404, description = "No active integrations match"),
    )
)]
pub async fn lists(
    State(app_state): State<AppState>,
    filter: core::result::Result<Query<ProviderFilter>, QueryRejection>,
) -> Result<impl IntoResponse, Error> {
    let filter = provider_filter(filter)?;
    let groups = esp_integration::fetch_lists(
        app_state.db_conn_ref(),
        &app_state.config,
        filter.provider.as_deref(),
    )
    .await?;

    let groups: Vec<IntegrationListsResponse> = groups.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::new(groups)))
}

/// GET one mailing list of an integration
#[utoipa::path(
    get,
    path = "/integrations/esp/{id}/lists/{list_id}",
    params(
        ("id" = Uuid, Path, description = "Integration id"),
        ("list_id" = String, Path, description = "Provider list id"),
    ),
    responses(
        (status = 200, description = "The mailing list"),
        (status = 404, description = "Integration or list not found"),
    )
)]
pub async fn read_list(
    State(app_state): State<AppState>,
    Path((id, list_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, Error> {
    let id = parse_id(&id)?;
    let list: MailingList =
        esp_integration::fetch_list(app_state.db_conn_ref(), &app_state.config, id, &list_id)
            .await?;

    Ok(Json(ApiResponse::new(list)))
}

/// DELETE deactivate an integration
#[utoipa::path(
    delete,
    path = "/integrations/esp/{id}",
    params(("id" = Uuid, Path, description = "Integration id")),
    responses(
        (status = 200, description = "Integration deactivated", body = Model),
        (status = 404, description = "Integration not found"),
    )
)]
pub async fn delete(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let id = parse_id(&id)?;
    let integration = esp_integration::deactivate(app_state.db_conn_ref(), id).await?;

    Ok(Json(ApiResponse::new(integration)))
}

/// POST re-test stored credentials
///
/// Always answers with the validation outcome, valid or not.
#[utoipa::path(
    post,
    path = "/integrations/esp/{id}/test",
    params(("id" = Uuid, Path, description = "Integration id")),
    responses(
        (status = 200, description = "Validation outcome"),
        (status = 404, description = "Integration missing or inactive"),
    )
)]
pub async fn test(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let id = parse_id(&id)?;
    let result: ValidationResult =
        esp_integration::test(app_state.db_conn_ref(), &app_state.config, id).await?;

    Ok(Json(ApiResponse::new(result)))
}
