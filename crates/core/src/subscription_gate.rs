//! The agent publication gate.
//!
//! Decides whether a signed-in profile may publish ("add") a property. The
//! decision is a pure function of the session facts, the outcome of the
//! active-plan lookup and the agent's current count of active listings; it
//! is recomputed on every request and never cached.
//!
//! A failed plan lookup is reported as [`GateDecision::LookupFailed`]
//! rather than folded into [`GateDecision::NoSubscription`]: publishing is
//! still refused, but callers can tell a transient error apart from an
//! agent that genuinely has no plan.

use serde::Serialize;

use crate::error::CoreError;
use crate::tier::remaining_slots;
use crate::types::DbId;

/// Where agents without a plan are sent.
pub const SUBSCRIPTION_ROUTE: &str = "/subscription";

/// Which kind of row granted the active plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// Assigned by an admin (`agent_tier_assignments`).
    Assignment,
    /// Purchased through checkout (`agent_subscriptions`).
    Subscription,
}

/// The active plan found for an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivePlan {
    pub tier_id: DbId,
    pub tier_name: String,
    pub property_limit: Option<i32>,
    pub source: PlanSource,
}

/// Outcome of looking up an agent's active plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanLookup {
    Found(ActivePlan),
    Missing,
    Failed(String),
}

impl PlanLookup {
    /// Combine the two plan sources. An admin assignment wins over a
    /// purchased subscription when both are active.
    pub fn resolve(assignment: Option<ActivePlan>, subscription: Option<ActivePlan>) -> Self {
        match assignment.or(subscription) {
            Some(plan) => PlanLookup::Found(plan),
            None => PlanLookup::Missing,
        }
    }
}

/// Everything the gate needs to know about the caller.
#[derive(Debug, Clone)]
pub struct GateInput<'a> {
    pub email: &'a str,
    pub user_type: &'a str,
    pub role: &'a str,
    /// Configured super-admin address, if any.
    pub super_admin_email: Option<&'a str>,
    pub plan: PlanLookup,
    /// Listings of this agent currently in `active` status.
    pub active_properties: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// Session or plan query still in flight (client-side only).
    Loading,
    SuperAdminBypass,
    AdminBypass,
    NotAgent,
    NoSubscription {
        redirect: &'static str,
    },
    HasSubscription {
        plan: ActivePlan,
        active_properties: i64,
        remaining: Option<i64>,
    },
    LimitReached {
        plan: ActivePlan,
        active_properties: i64,
    },
    LookupFailed {
        reason: String,
    },
}

impl GateDecision {
    /// Whether the caller may publish a new listing right now.
    pub fn allows_publish(&self) -> bool {
        matches!(
            self,
            GateDecision::SuperAdminBypass
                | GateDecision::AdminBypass
                | GateDecision::HasSubscription { .. }
        )
    }

    /// Convert a refusing decision into the matching [`CoreError`].
    pub fn ensure_allowed(self) -> Result<GateDecision, CoreError> {
        match self {
            GateDecision::NoSubscription { redirect } => {
                Err(CoreError::SubscriptionRequired { redirect })
            }
            GateDecision::NotAgent => Err(CoreError::Forbidden(
                "Only agents can publish properties".into(),
            )),
            GateDecision::LimitReached { plan, .. } => Err(limit_error(&plan)),
            GateDecision::LookupFailed { reason } => Err(CoreError::Unavailable(format!(
                "Could not verify subscription status: {reason}"
            ))),
            GateDecision::Loading => Err(CoreError::Unavailable(
                "Subscription status is still loading".into(),
            )),
            allowed => Ok(allowed),
        }
    }

    /// Active-listing cap a permitting decision was made under. `None` for
    /// unlimited plans and the bypasses.
    pub fn listing_limit(&self) -> Option<i64> {
        match self {
            GateDecision::HasSubscription { plan, .. } => plan.property_limit.map(i64::from),
            _ => None,
        }
    }

    /// Refusal for a permitting decision whose plan turned out to be full
    /// once the listing count was taken under lock.
    pub fn limit_reached(&self, active_properties: i64) -> CoreError {
        match self {
            GateDecision::HasSubscription { plan, .. } | GateDecision::LimitReached { plan, .. } => {
                limit_error(plan)
            }
            _ => CoreError::Forbidden(format!(
                "Listing limit reached with {active_properties} active properties"
            )),
        }
    }
}

fn limit_error(plan: &ActivePlan) -> CoreError {
    CoreError::Forbidden(format!(
        "The {} plan allows at most {} active properties",
        plan.tier_name,
        plan.property_limit.unwrap_or_default()
    ))
}

/// Return `true` if `email` matches the configured super-admin address.
pub fn is_super_admin(email: &str, super_admin_email: Option<&str>) -> bool {
    super_admin_email
        .map(str::trim)
        .filter(|configured| !configured.is_empty())
        .is_some_and(|configured| configured.eq_ignore_ascii_case(email.trim()))
}

/// Evaluate the gate.
///
/// Only the super-admin address lets an agent publish without a plan. The
/// admin role bypasses for staff accounts, never for agents, so an agent
/// who is also an admin is still held to their plan.
pub fn evaluate(input: GateInput<'_>) -> GateDecision {
    if is_super_admin(input.email, input.super_admin_email) {
        return GateDecision::SuperAdminBypass;
    }
    if input.user_type != crate::roles::USER_TYPE_AGENT {
        return if input.role == crate::roles::ROLE_ADMIN {
            GateDecision::AdminBypass
        } else {
            GateDecision::NotAgent
        };
    }

    match input.plan {
        PlanLookup::Failed(reason) => GateDecision::LookupFailed { reason },
        PlanLookup::Missing => GateDecision::NoSubscription {
            redirect: SUBSCRIPTION_ROUTE,
        },
        PlanLookup::Found(plan) => {
            let remaining = remaining_slots(plan.property_limit, input.active_properties);
            if remaining == Some(0) {
                GateDecision::LimitReached {
                    plan,
                    active_properties: input.active_properties,
                }
            } else {
                GateDecision::HasSubscription {
                    plan,
                    active_properties: input.active_properties,
                    remaining,
                }
            }
        }
    }
}
