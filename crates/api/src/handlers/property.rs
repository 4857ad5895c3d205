//! Handlers for the `/properties` resource and the agent dashboard.
//!
//! Public reads only ever show `active` listings to anonymous callers. Every
//! write publishes a row change on the `properties` channel.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use inmo_core::change_feed::{ChangeOp, RowChange, TABLE_PROPERTIES};
use inmo_core::error::CoreError;
use inmo_core::links::{mailto_link, whatsapp_link, OutboundLink};
use inmo_core::profile::{apply_privacy, ContactFields, PrivacyFlags};
use inmo_core::property::{
    ensure_image_capacity, is_publicly_visible, like_patterns, search_terms,
    validate_image_urls, validate_operation, validate_price_range, validate_property_type,
    validate_status_transition, STATUS_ACTIVE, STATUS_PAUSED,
};
use inmo_core::session::SessionProfile;
use inmo_core::types::DbId;
use inmo_db::models::property::{
    CappedWrite, CreateProperty, Property, PropertyResponse, PropertySearch, StatusCounts,
    UpdateProperty,
};
use inmo_db::repositories::{ProfileRepo, PropertyRepo};
use inmo_events::{event_types, PlatformEvent};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::subscription::ensure_can_publish;
use crate::handlers::{not_found, read_file_field};
use crate::middleware::auth::Session;
use crate::middleware::rbac::RequireAgent;
use crate::query::{clamp_limit, PaginationParams, MAX_PAGE_SIZE};
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;
use crate::storage::{property_image_path, validate_image};

const DEFAULT_FEATURED: i64 = 6;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePropertyRequest {
    #[validate(length(min = 3, max = 200, message = "must be between 3 and 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "must be greater than zero"))]
    pub price: i64,
    pub currency: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub location: String,
    pub property_type: String,
    pub operation: String,
    #[validate(range(min = 0, max = 100, message = "must be between 0 and 100"))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0, max = 100, message = "must be between 0 and 100"))]
    pub bathrooms: Option<i32>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub area_m2: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 3, max = 200, message = "must be between 3 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "must be greater than zero"))]
    pub price: Option<i64>,
    pub currency: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub operation: Option<String>,
    #[validate(range(min = 0, max = 100, message = "must be between 0 and 100"))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0, max = 100, message = "must be between 0 and 100"))]
    pub bathrooms: Option<i32>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub area_m2: Option<f64>,
}

impl CreatePropertyRequest {
    /// Trim the free-text fields. Runs before `validate()` so the length
    /// rules apply to the stored values.
    pub fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.location = self.location.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self.images = self.images.iter().map(|u| u.trim().to_string()).collect();
        self
    }
}

impl UpdatePropertyRequest {
    pub fn trimmed(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.location = self.location.map(|l| l.trim().to_string());
        self.description = self.description.map(|d| d.trim().to_string());
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct FeaturedParams {
    pub limit: Option<i64>,
}

/// Query parameters for `GET /properties/search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Minimum number of bedrooms.
    pub bedrooms: Option<i32>,
    pub operation: Option<String>,
    pub property_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub properties: Vec<PropertyResponse>,
    pub counts: StatusCounts,
}

#[derive(Debug, Serialize)]
pub struct ContactLinks {
    pub agent_id: DbId,
    pub agent_name: String,
    pub links: Vec<OutboundLink>,
}

// ---------------------------------------------------------------------------
// Public reads
// ---------------------------------------------------------------------------

/// GET /api/v1/properties
///
/// Active listings, newest first.
pub async fn list_feed(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<PageResponse<PropertyResponse>>> {
    let (limit, offset) = params.window();
    let rows = PropertyRepo::list_feed(&state.pool, limit, offset).await?;
    Ok(Json(PageResponse {
        data: rows.into_iter().map(PropertyResponse::from).collect(),
        limit,
        offset,
    }))
}

/// GET /api/v1/properties/featured
pub async fn list_featured(
    State(state): State<AppState>,
    Query(params): Query<FeaturedParams>,
) -> AppResult<Json<DataResponse<Vec<PropertyResponse>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_FEATURED, MAX_PAGE_SIZE);
    let rows = PropertyRepo::list_featured(&state.pool, limit).await?;
    Ok(Json(DataResponse {
        data: rows.into_iter().map(PropertyResponse::from).collect(),
    }))
}

/// GET /api/v1/properties/search
///
/// Every term of `q` must match the title, location, description or
/// property type. Filters are combined with AND.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<PageResponse<PropertyResponse>>> {
    validate_price_range(params.min_price, params.max_price)?;
    if let Some(op) = params.operation.as_deref() {
        validate_operation(op)?;
    }
    if let Some(kind) = params.property_type.as_deref() {
        validate_property_type(kind)?;
    }

    let terms = search_terms(params.q.as_deref().unwrap_or_default());
    let filters = PropertySearch {
        patterns: like_patterns(&terms),
        min_price: params.min_price,
        max_price: params.max_price,
        min_bedrooms: params.bedrooms,
        operation: params.operation,
        property_type: params.property_type,
    };

    let window = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let (limit, offset) = window.window();
    let rows = PropertyRepo::search(&state.pool, &filters, limit, offset).await?;

    tracing::debug!(terms = ?terms, results = rows.len(), "Property search");
    Ok(Json(PageResponse {
        data: rows.into_iter().map(PropertyResponse::from).collect(),
        limit,
        offset,
    }))
}

/// GET /api/v1/properties/{id}
///
/// Listings that are not active are only visible to their agent and admins.
pub async fn get_property(
    State(state): State<AppState>,
    session: Option<Session>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PropertyResponse>>> {
    let property = PropertyRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Property", id))?;

    let can_see = is_publicly_visible(&property.status)
        || session
            .as_ref()
            .is_some_and(|s| can_manage(s.profile(), &property));
    if !can_see {
        return Err(not_found("Property", id));
    }

    Ok(Json(DataResponse {
        data: property.into(),
    }))
}

/// GET /api/v1/properties/{id}/contact
///
/// WhatsApp and e-mail links for the listing's agent. Hidden contact fields
/// produce no link.
pub async fn contact_links(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ContactLinks>>> {
    let property = PropertyRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|p| is_publicly_visible(&p.status))
        .ok_or_else(|| not_found("Property", id))?;

    let agent = ProfileRepo::find_with_email(&state.pool, property.agent_id)
        .await?
        .ok_or_else(|| not_found("Profile", property.agent_id))?;

    let contact = apply_privacy(
        ContactFields {
            email: Some(agent.email),
            phone: agent.profile.phone.clone(),
            whatsapp: agent.profile.whatsapp.clone(),
        },
        PrivacyFlags {
            show_email: agent.profile.show_email,
            show_phone: agent.profile.show_phone,
        },
    );

    let message = format!("Hola, me interesa la propiedad \"{}\"", property.title);
    let mut links = Vec::new();
    if let Some(number) = contact.whatsapp.as_deref().or(contact.phone.as_deref()) {
        match whatsapp_link(number, &message) {
            Ok(link) => links.push(link),
            Err(e) => tracing::debug!(agent_id = property.agent_id, error = %e, "No WhatsApp link"),
        }
    }
    if let Some(email) = contact.email.as_deref() {
        match mailto_link(email, &property.title, &message) {
            Ok(link) => links.push(link),
            Err(e) => tracing::debug!(agent_id = property.agent_id, error = %e, "No e-mail link"),
        }
    }

    Ok(Json(DataResponse {
        data: ContactLinks {
            agent_id: property.agent_id,
            agent_name: agent.profile.full_name,
            links,
        },
    }))
}

// ---------------------------------------------------------------------------
// Agent writes
// ---------------------------------------------------------------------------

/// POST /api/v1/properties
///
/// Publish a listing. Guarded by the subscription gate: 402 with a redirect
/// when the agent has no plan, 403 at the plan's limit or for non-agents,
/// 503 when the plan cannot be looked up. The limit is checked again under
/// the agent's row lock when the listing is inserted.
pub async fn create_property(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<CreatePropertyRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<PropertyResponse>>)> {
    let decision = ensure_can_publish(&state, session.profile()).await?;

    let input = input.trimmed();
    input.validate()?;
    validate_operation(&input.operation)?;
    validate_property_type(&input.property_type)?;
    validate_image_urls(&input.images)?;

    let new = CreateProperty {
        agent_id: session.profile_id(),
        title: input.title,
        description: input.description,
        price: input.price,
        currency: input.currency.unwrap_or_else(|| "USD".to_string()),
        location: input.location,
        property_type: input.property_type,
        operation: input.operation,
        bedrooms: input.bedrooms,
        bathrooms: input.bathrooms,
        area_m2: input.area_m2,
        images: input.images,
    };
    let property = match PropertyRepo::create_capped(&state.pool, &new, decision.listing_limit())
        .await?
    {
        CappedWrite::Written(property) => property,
        CappedWrite::LimitReached { active } => {
            tracing::info!(agent_id = new.agent_id, active, "Listing limit reached");
            return Err(AppError::Core(decision.limit_reached(active)));
        }
        CappedWrite::Missing => return Err(not_found("Profile", new.agent_id)),
    };

    tracing::info!(
        property_id = property.id,
        agent_id = property.agent_id,
        "Property published"
    );
    publish_change(&state, ChangeOp::Insert, &property);

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: property.into(),
        }),
    ))
}

/// PUT /api/v1/properties/{id}
pub async fn update_property(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePropertyRequest>,
) -> AppResult<Json<DataResponse<PropertyResponse>>> {
    let input = input.trimmed();
    input.validate()?;
    if let Some(op) = input.operation.as_deref() {
        validate_operation(op)?;
    }
    if let Some(kind) = input.property_type.as_deref() {
        validate_property_type(kind)?;
    }

    load_managed(&state, session.profile(), id).await?;

    let changes = UpdateProperty {
        title: input.title,
        description: input.description,
        price: input.price,
        currency: input.currency,
        location: input.location,
        property_type: input.property_type,
        operation: input.operation,
        bedrooms: input.bedrooms,
        bathrooms: input.bathrooms,
        area_m2: input.area_m2,
    };
    let property = PropertyRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or_else(|| not_found("Property", id))?;

    publish_change(&state, ChangeOp::Update, &property);
    Ok(Json(DataResponse {
        data: property.into(),
    }))
}

/// POST /api/v1/properties/{id}/pause
///
/// An admin pausing someone else's listing notifies its agent.
pub async fn pause_property(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PropertyResponse>>> {
    let property = change_status(&state, session.profile(), id, STATUS_PAUSED).await?;

    if property.agent_id != session.profile_id() {
        state.event_bus.publish(
            PlatformEvent::new(event_types::PROPERTY_PAUSED_BY_ADMIN)
                .with_source("property", property.id)
                .with_actor(session.profile_id())
                .with_target(property.agent_id)
                .with_payload(serde_json::json!({ "title": property.title })),
        );
    }

    Ok(Json(DataResponse {
        data: property.into(),
    }))
}

/// POST /api/v1/properties/{id}/activate
///
/// Re-activating counts against the plan's listing limit. The listing is
/// authorized first, then the caller must pass the publication gate, and
/// the limit is checked again under the agent's row lock.
pub async fn activate_property(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PropertyResponse>>> {
    let current = load_managed(&state, session.profile(), id).await?;
    validate_status_transition(&current.status, STATUS_ACTIVE)?;
    let decision = ensure_can_publish(&state, session.profile()).await?;

    let outcome =
        PropertyRepo::activate_capped(&state.pool, id, current.agent_id, decision.listing_limit())
            .await?;
    let property = match outcome {
        CappedWrite::Written(property) => property,
        CappedWrite::LimitReached { active } => {
            tracing::info!(property_id = id, active, "Listing limit reached");
            return Err(AppError::Core(decision.limit_reached(active)));
        }
        CappedWrite::Missing => return Err(not_found("Property", id)),
    };

    tracing::info!(
        property_id = id,
        from = %current.status,
        to = STATUS_ACTIVE,
        "Property status changed"
    );
    publish_change(&state, ChangeOp::Update, &property);
    Ok(Json(DataResponse {
        data: property.into(),
    }))
}

/// POST /api/v1/properties/{id}/promote
///
/// Toggle the featured flag.
pub async fn toggle_promoted(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PropertyResponse>>> {
    load_managed(&state, session.profile(), id).await?;
    let property = PropertyRepo::toggle_promoted(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Property", id))?;

    tracing::info!(property_id = id, promoted = property.is_promoted, "Promotion toggled");
    publish_change(&state, ChangeOp::Update, &property);
    Ok(Json(DataResponse {
        data: property.into(),
    }))
}

/// DELETE /api/v1/properties/{id}
pub async fn delete_property(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    remove_property(&state, session.profile(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/properties/{id}/images
///
/// Multipart upload with a single `file` field. The stored image's public
/// URL is appended to the listing.
pub async fn upload_image(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<PropertyResponse>>)> {
    let existing = load_managed(&state, session.profile(), id).await?;
    ensure_image_capacity(existing.images.len())?;

    let file = read_file_field(multipart).await?;
    let ext = validate_image(&file.filename, file.data.len())?;
    let path = property_image_path(id, &ext);

    state.storage.upload(&path, &file.data).await?;
    let url = state.storage.public_url(&path);

    let Some(property) = PropertyRepo::append_image(&state.pool, id, &url).await? else {
        state.storage.delete(&path).await?;
        return Err(not_found("Property", id));
    };

    tracing::info!(property_id = id, path = %path, bytes = file.data.len(), "Property image stored");
    publish_change(&state, ChangeOp::Update, &property);

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: property.into(),
        }),
    ))
}

/// GET /api/v1/dashboard/properties
///
/// Every listing of the calling agent, any status, with per-status counts.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAgent(session): RequireAgent,
) -> AppResult<Json<DataResponse<Dashboard>>> {
    let agent_id = session.profile_id();
    let (rows, counts) = tokio::try_join!(
        PropertyRepo::list_by_agent(&state.pool, agent_id),
        PropertyRepo::status_counts_by_agent(&state.pool, agent_id),
    )
    .map_err(AppError::Database)?;

    Ok(Json(DataResponse {
        data: Dashboard {
            properties: rows.into_iter().map(PropertyResponse::from).collect(),
            counts,
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn can_manage(profile: &SessionProfile, property: &Property) -> bool {
    profile.is_admin() || property.agent_id == profile.profile_id
}

/// Load a listing the caller owns or, as an admin, may manage.
async fn load_managed(
    state: &AppState,
    profile: &SessionProfile,
    id: DbId,
) -> AppResult<Property> {
    let property = PropertyRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Property", id))?;
    if !can_manage(profile, &property) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the listing's agent or an admin can change it".into(),
        )));
    }
    Ok(property)
}

async fn change_status(
    state: &AppState,
    profile: &SessionProfile,
    id: DbId,
    to: &str,
) -> AppResult<Property> {
    let current = load_managed(state, profile, id).await?;
    validate_status_transition(&current.status, to)?;

    let property = PropertyRepo::set_status(&state.pool, id, to)
        .await?
        .ok_or_else(|| not_found("Property", id))?;

    tracing::info!(property_id = id, from = %current.status, to, "Property status changed");
    publish_change(state, ChangeOp::Update, &property);
    Ok(property)
}

/// Delete a listing on behalf of its agent or an admin. Deleting someone
/// else's listing notifies the agent.
pub(crate) async fn remove_property(
    state: &AppState,
    profile: &SessionProfile,
    id: DbId,
) -> AppResult<()> {
    let property = load_managed(state, profile, id).await?;
    if !PropertyRepo::delete(&state.pool, id).await? {
        return Err(not_found("Property", id));
    }

    for url in &property.images {
        if let Some(path) = url.split_once("/storage/").map(|(_, p)| p) {
            if let Err(e) = state.storage.delete(path).await {
                tracing::warn!(property_id = id, path, error = %e, "Failed to remove image");
            }
        }
    }

    tracing::info!(property_id = id, deleted_by = profile.profile_id, "Property deleted");
    state
        .event_bus
        .publish_change(RowChange::delete(TABLE_PROPERTIES, id));

    if property.agent_id != profile.profile_id {
        state.event_bus.publish(
            PlatformEvent::new(event_types::PROPERTY_DELETED_BY_ADMIN)
                .with_source("property", id)
                .with_actor(profile.profile_id)
                .with_target(property.agent_id)
                .with_payload(serde_json::json!({ "title": property.title })),
        );
    }
    Ok(())
}

fn publish_change(state: &AppState, op: ChangeOp, property: &Property) {
    let row = PropertyResponse::from(property.clone());
    state
        .event_bus
        .publish_change(RowChange::upsert(TABLE_PROPERTIES, op, property.id, &row));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreatePropertyRequest {
        CreatePropertyRequest {
            title: "Casa en Zona 14".into(),
            description: None,
            price: 1_500_000,
            currency: None,
            location: "Zona 14".into(),
            property_type: "house".into(),
            operation: "sale".into(),
            bedrooms: Some(3),
            bathrooms: Some(2),
            area_m2: Some(180.0),
            images: vec![],
        }
    }

    #[test]
    fn valid_listing_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn out_of_range_fields_rejected() {
        let mut input = request();
        input.title = "ab".into();
        input.price = 0;
        input.bedrooms = Some(101);
        input.area_m2 = Some(-1.0);
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("bedrooms"));
        assert!(fields.contains_key("area_m2"));
    }

    #[test]
    fn blank_location_rejected() {
        let mut input = request();
        input.location = String::new();
        assert!(input.validate().unwrap_err().field_errors().contains_key("location"));
    }

    #[test]
    fn whitespace_padding_does_not_satisfy_lengths() {
        let mut input = request();
        input.title = "   a   ".into();
        input.location = "    ".into();
        let input = input.trimmed();
        assert_eq!(input.title, "a");

        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("location"));
    }

    #[test]
    fn trimmed_update_checks_present_fields() {
        let update = UpdatePropertyRequest {
            location: Some("   ".into()),
            ..Default::default()
        }
        .trimmed();
        assert!(update.validate().unwrap_err().field_errors().contains_key("location"));

        let update = UpdatePropertyRequest {
            title: Some("  Casa amplia  ".into()),
            ..Default::default()
        }
        .trimmed();
        assert!(update.validate().is_ok());
        assert_eq!(update.title.as_deref(), Some("Casa amplia"));
    }

    #[test]
    fn blank_description_dropped() {
        let mut input = request();
        input.description = Some("  ".into());
        assert_eq!(input.trimmed().description, None);
    }
}
