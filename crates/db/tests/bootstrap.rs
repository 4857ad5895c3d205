use sqlx::PgPool;
use inmo_db::repositories::TierRepo;

/// Full bootstrap: connect, migrate, verify the seeded plans.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    inmo_db::health_check(&pool).await.unwrap();

    let tiers = TierRepo::list(&pool).await.unwrap();
    let summary: Vec<(&str, Option<i32>)> = tiers
        .iter()
        .map(|t| (t.name.as_str(), t.property_limit))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Bronce", Some(5)),
            ("Plata", Some(15)),
            ("Oro", None),
            ("Platino", None),
        ]
    );
    for tier in &tiers {
        assert!(
            tier.annual_price_cents > tier.monthly_price_cents,
            "{} annual price should exceed monthly",
            tier.name
        );
    }
}

/// Tier lookup by name ignores case.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_tier_by_name(pool: PgPool) {
    let oro = TierRepo::find_by_name(&pool, "oro").await.unwrap().unwrap();
    assert_eq!(oro.name, "Oro");
    assert!(TierRepo::find_by_name(&pool, "Diamante").await.unwrap().is_none());
}
