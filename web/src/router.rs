use crate::{controller, controller::health_check_controller, error, params, AppState};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::controller::esp_integration_controller;

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "ESP Integrations API"
        ),
        paths(
            esp_integration_controller::create,
            esp_integration_controller::index,
            esp_integration_controller::lists,
            esp_integration_controller::read_list,
            esp_integration_controller::delete,
            esp_integration_controller::test,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                domain::esp_integrations::Model,
                domain::provider::EspProvider,
                params::esp_integration::CreateParams,
                params::esp_integration::IntegrationListsResponse,
            )
        ),
        tags(
            (name = "esp_integrations", description = "Email-service-provider integrations API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(esp_integration_routes(app_state.clone()))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .fallback(controller::fallback)
        .layer(middleware::map_response_with_state(
            app_state,
            error::attach_error_details,
        ))
}

fn esp_integration_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/integrations/esp", post(esp_integration_controller::create))
        .route("/integrations/esp", get(esp_integration_controller::index))
        .route(
            "/integrations/esp/lists",
            get(esp_integration_controller::lists),
        )
        .route(
            "/integrations/esp/{id}",
            delete(esp_integration_controller::delete),
        )
        .route(
            "/integrations/esp/{id}/test",
            post(esp_integration_controller::test),
        )
        .route(
            "/integrations/esp/{id}/lists/{list_id}",
            get(esp_integration_controller::read_list),
        )
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}
