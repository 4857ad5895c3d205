//! Page metadata for server-side rendering and link previews.

use axum::extract::{Path, State};
use axum::Json;
use inmo_core::property::{cover_image, is_publicly_visible};
use inmo_core::seo::{listing_meta, page_meta, ListingFacts, PageMeta};
use inmo_core::types::DbId;
use inmo_db::repositories::PropertyRepo;

use crate::error::AppResult;
use crate::handlers::not_found;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/seo/properties/{id}
pub async fn property_meta(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PageMeta>>> {
    let property = PropertyRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|p| is_publicly_visible(&p.status))
        .ok_or_else(|| not_found("Property", id))?;

    let facts = ListingFacts {
        id: property.id,
        title: &property.title,
        description: property.description.as_deref(),
        location: &property.location,
        price: property.price,
        currency: &property.currency,
        bedrooms: property.bedrooms,
        bathrooms: property.bathrooms,
        cover_image: cover_image(&property.images),
    };

    Ok(Json(DataResponse {
        data: listing_meta(&facts, &state.config.public_base_url),
    }))
}

/// GET /api/v1/seo/pages
///
/// Metadata for the home page.
pub async fn home_meta(State(state): State<AppState>) -> Json<DataResponse<PageMeta>> {
    Json(DataResponse {
        data: page_meta("/", &state.config.public_base_url),
    })
}

/// GET /api/v1/seo/pages/{*route}
///
/// Unknown routes get the not-found metadata with a 200, so the client can
/// still render a head.
pub async fn route_meta(
    State(state): State<AppState>,
    Path(route): Path<String>,
) -> Json<DataResponse<PageMeta>> {
    Json(DataResponse {
        data: page_meta(&route, &state.config.public_base_url),
    })
}
