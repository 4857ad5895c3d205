//! Handlers for the `/subscription` resource: tiers, the publication gate,
//! checkout and the caller's current plan.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use inmo_core::links::OutboundLink;
use inmo_core::session::SessionProfile;
use inmo_core::subscription_gate::{self, GateDecision, GateInput, PlanLookup, PlanSource};
use inmo_core::tier::{period_end, price_for_period, validate_billing_period};
use inmo_core::types::DbId;
use inmo_db::models::subscription::{AgentSubscription, CreateSubscription};
use inmo_db::models::tier::SubscriptionTier;
use inmo_db::models::tier_assignment::AgentTierAssignment;
use inmo_db::repositories::{PropertyRepo, SubscriptionRepo, TierAssignmentRepo, TierRepo};
use inmo_events::{event_types, PlatformEvent};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::not_found;
use crate::handlers::payment::payment_links;
use crate::middleware::auth::Session;
use crate::middleware::rbac::RequireAgent;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub tier_id: DbId,
    pub billing_period: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub subscription: AgentSubscription,
    pub tier_name: String,
    pub payment_links: Vec<OutboundLink>,
}

#[derive(Debug, Serialize)]
pub struct CurrentPlan {
    pub assignment: Option<AgentTierAssignment>,
    pub subscription: Option<AgentSubscription>,
    pub decision: GateDecision,
}

// ---------------------------------------------------------------------------
// Gate evaluation
// ---------------------------------------------------------------------------

/// Look up the agent's active plan. A manual assignment wins over a
/// purchased subscription; a database failure becomes `PlanLookup::Failed`.
pub(crate) async fn lookup_plan(state: &AppState, agent_id: DbId) -> PlanLookup {
    let assignment = match TierAssignmentRepo::find_active_plan(&state.pool, agent_id).await {
        Ok(row) => row.map(|r| r.into_plan(PlanSource::Assignment)),
        Err(e) => {
            tracing::error!(agent_id, error = %e, "Tier assignment lookup failed");
            return PlanLookup::Failed(e.to_string());
        }
    };
    let subscription = match SubscriptionRepo::find_active_plan(&state.pool, agent_id).await {
        Ok(row) => row.map(|r| r.into_plan(PlanSource::Subscription)),
        Err(e) => {
            tracing::error!(agent_id, error = %e, "Subscription lookup failed");
            return PlanLookup::Failed(e.to_string());
        }
    };
    PlanLookup::resolve(assignment, subscription)
}

/// Decide whether `profile` may publish a listing right now.
pub(crate) async fn evaluate_gate(state: &AppState, profile: &SessionProfile) -> GateDecision {
    let (plan, active_properties) = if profile.is_agent() {
        let plan = lookup_plan(state, profile.profile_id).await;
        let active = match PropertyRepo::count_active_by_agent(&state.pool, profile.profile_id).await
        {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(profile_id = profile.profile_id, error = %e, "Listing count failed");
                return GateDecision::LookupFailed {
                    reason: e.to_string(),
                };
            }
        };
        (plan, active)
    } else {
        (PlanLookup::Missing, 0)
    };

    subscription_gate::evaluate(GateInput {
        email: &profile.email,
        user_type: &profile.user_type,
        role: &profile.role,
        super_admin_email: state.config.super_admin_email.as_deref(),
        plan,
        active_properties,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/subscription/tiers
pub async fn list_tiers(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SubscriptionTier>>>> {
    let tiers = TierRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: tiers }))
}

/// GET /api/v1/subscription/gate
pub async fn gate(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<DataResponse<GateDecision>>> {
    let decision = evaluate_gate(&state, session.profile()).await;
    Ok(Json(DataResponse { data: decision }))
}

/// POST /api/v1/subscription/checkout
///
/// Start a new paid period on `tier_id`, replacing any active subscription,
/// and return the links the agent can pay through.
pub async fn checkout(
    State(state): State<AppState>,
    RequireAgent(session): RequireAgent,
    Json(input): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CheckoutResponse>>)> {
    validate_billing_period(&input.billing_period)?;

    let tier = TierRepo::find_by_id(&state.pool, input.tier_id)
        .await?
        .ok_or_else(|| not_found("SubscriptionTier", input.tier_id))?;
    let amount_cents = price_for_period(
        tier.monthly_price_cents,
        tier.annual_price_cents,
        &input.billing_period,
    )?;

    let start = Utc::now();
    let subscription = SubscriptionRepo::activate(
        &state.pool,
        &CreateSubscription {
            agent_id: session.profile_id(),
            tier_id: tier.id,
            billing_period: input.billing_period.clone(),
            amount_cents,
            current_period_start: start,
            current_period_end: period_end(start, &input.billing_period)?,
        },
    )
    .await?
    .ok_or_else(|| not_found("Profile", session.profile_id()))?;

    tracing::info!(
        profile_id = session.profile_id(),
        tier = %tier.name,
        billing_period = %subscription.billing_period,
        "Subscription activated"
    );

    state.event_bus.publish(
        PlatformEvent::new(event_types::SUBSCRIPTION_ACTIVATED)
            .with_source("agent_subscription", subscription.id)
            .with_actor(session.profile_id())
            .with_target(session.profile_id())
            .with_payload(serde_json::json!({
                "tier_name": tier.name,
                "period_end": subscription.current_period_end,
            })),
    );

    let links = payment_links(&state.config, &tier, &input.billing_period, amount_cents);
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CheckoutResponse {
                subscription,
                tier_name: tier.name,
                payment_links: links,
            },
        }),
    ))
}

/// GET /api/v1/subscription/current
pub async fn current(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<DataResponse<CurrentPlan>>> {
    let agent_id = session.profile_id();
    let (assignment, subscription) = tokio::try_join!(
        TierAssignmentRepo::find_active(&state.pool, agent_id),
        SubscriptionRepo::find_active(&state.pool, agent_id),
    )
    .map_err(AppError::Database)?;

    let decision = evaluate_gate(&state, session.profile()).await;

    Ok(Json(DataResponse {
        data: CurrentPlan {
            assignment,
            subscription,
            decision,
        },
    }))
}

/// Fail unless the gate allows `profile` to publish.
pub(crate) async fn ensure_can_publish(
    state: &AppState,
    profile: &SessionProfile,
) -> Result<GateDecision, AppError> {
    let decision = evaluate_gate(state, profile).await;
    tracing::debug!(profile_id = profile.profile_id, ?decision, "Publication gate evaluated");
    Ok(decision.ensure_allowed()?)
}
