//! Payment methods offered for a tier.
//!
//! Only URLs are constructed here. Payment itself happens with the provider
//! and is confirmed by an admin assigning the tier.

use axum::extract::{Query, State};
use axum::Json;
use inmo_core::links::{
    binance_pay_link, external_payment_link, mailto_link, paypal_link, whatsapp_link,
    OutboundLink,
};
use inmo_core::tier::{format_cents, price_for_period, BILLING_MONTHLY};
use inmo_core::types::DbId;
use inmo_db::models::tier::SubscriptionTier;
use inmo_db::repositories::TierRepo;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::error::AppResult;
use crate::handlers::not_found;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentMethodsQuery {
    pub tier_id: DbId,
    pub billing_period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentMethods {
    pub tier_id: DbId,
    pub tier_name: String,
    pub billing_period: String,
    pub amount_cents: i64,
    pub links: Vec<OutboundLink>,
}

/// GET /api/v1/payment/methods?tier_id=&billing_period=
pub async fn list_methods(
    State(state): State<AppState>,
    Query(params): Query<PaymentMethodsQuery>,
) -> AppResult<Json<DataResponse<PaymentMethods>>> {
    let tier = TierRepo::find_by_id(&state.pool, params.tier_id)
        .await?
        .ok_or_else(|| not_found("SubscriptionTier", params.tier_id))?;
    let period = params
        .billing_period
        .unwrap_or_else(|| BILLING_MONTHLY.to_string());

    let amount_cents = price_for_period(tier.monthly_price_cents, tier.annual_price_cents, &period)?;
    let links = payment_links(&state.config, &tier, &period, amount_cents);

    Ok(Json(DataResponse {
        data: PaymentMethods {
            tier_id: tier.id,
            tier_name: tier.name,
            billing_period: period,
            amount_cents,
            links,
        },
    }))
}

/// Every link the configuration allows for paying `amount_cents` on `tier`.
///
/// A provider whose configured value does not produce a valid link is
/// skipped with a warning rather than failing the request.
pub(crate) fn payment_links(
    config: &ServerConfig,
    tier: &SubscriptionTier,
    period: &str,
    amount_cents: i64,
) -> Vec<OutboundLink> {
    let message = format!(
        "Hola, quiero contratar el plan {} ({period}) por {} USD",
        tier.name,
        format_cents(amount_cents)
    );

    let candidates = [
        tier.payment_link_url.as_deref().map(external_payment_link),
        config
            .paypal_handle
            .as_deref()
            .map(|handle| paypal_link(handle, amount_cents)),
        config
            .binance_pay_id
            .as_deref()
            .map(|id| binance_pay_link(id, amount_cents)),
        config
            .whatsapp_number
            .as_deref()
            .map(|phone| whatsapp_link(phone, &message)),
        config
            .contact_email
            .as_deref()
            .map(|email| mailto_link(email, &format!("Plan {}", tier.name), &message)),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(|link| match link {
            Ok(link) => Some(link),
            Err(e) => {
                tracing::warn!(tier_id = tier.id, error = %e, "Skipping misconfigured payment link");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::auth::jwt::JwtConfig;

    fn config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 3000,
            cors_origins: vec![],
            request_timeout_secs: 30,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                access_token_expiry_mins: 15,
                refresh_token_expiry_days: 7,
            },
            super_admin_email: None,
            storage_root: "storage".into(),
            public_base_url: "http://localhost:3000".into(),
            whatsapp_number: Some("+502 5555 1234".into()),
            contact_email: None,
            paypal_handle: Some("not a handle".into()),
            binance_pay_id: Some("123456".into()),
        }
    }

    fn tier() -> SubscriptionTier {
        SubscriptionTier {
            id: 2,
            name: "Plata".into(),
            description: None,
            monthly_price_cents: 2_500,
            annual_price_cents: 25_000,
            property_limit: Some(15),
            sort_order: 2,
            payment_link_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn misconfigured_providers_are_skipped() {
        let links = payment_links(&config(), &tier(), "monthly", 2_500);
        let providers: Vec<_> = links.iter().map(|l| l.provider).collect();
        assert_eq!(providers, vec!["binance", "whatsapp"]);
        assert!(links[0].url.contains("amount=25.00"));
        assert!(links[1].url.starts_with("https://wa.me/50255551234?text="));
    }
}
