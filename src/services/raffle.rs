use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::SqlitePool;

use crate::error::EngineError;
use crate::services::registration::RegistrationSummary;

/// Upper bound on a requested pool size, matching the admin UI cap.
pub const MAX_POOL_LIMIT: usize = 1000;

/// Loads the eligible pool for an event (optionally restricted by role),
/// uniformly shuffled, truncated to `limit` when one is given. Each call
/// reshuffles; a raffle session is repeatable by fetching a fresh pool.
pub async fn shuffled_pool(
    pool: &SqlitePool,
    event_id: i64,
    role: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<RegistrationSummary>, EngineError> {
    let mut entries =
        crate::services::registration::list_for_event(pool, event_id, role).await?;
    entries.shuffle(&mut rand::thread_rng());
    if let Some(limit) = limit {
        entries.truncate(limit.min(MAX_POOL_LIMIT));
    }
    Ok(entries)
}

/// One independent draw over a pool of the given size: a uniform index in
/// `[0, len)`, or nothing for an empty pool, where the caller blocks the
/// action instead of crashing. Previous winners stay in the pool unless the
/// caller filters them out.
pub fn draw(len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(rand::thread_rng().gen_range(0..len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil;

    #[test]
    fn empty_pool_draws_nothing() {
        assert_eq!(draw(0), None);
    }

    #[test]
    fn draw_stays_in_range() {
        for _ in 0..1000 {
            let index = draw(5).unwrap();
            assert!(index < 5);
        }
    }

    #[test]
    fn draws_are_roughly_uniform() {
        // Chi-square sanity bound: 4 degrees of freedom, the 99.9th
        // percentile is ~18.5; a biased generator blows far past it.
        let mut counts = [0u32; 5];
        for _ in 0..10_000 {
            counts[draw(5).unwrap()] += 1;
        }
        let expected = 2000.0_f64;
        let chi_square: f64 = counts
            .iter()
            .map(|&c| {
                let diff = f64::from(c) - expected;
                diff * diff / expected
            })
            .sum();
        assert!(chi_square < 25.0, "chi-square {chi_square} too high: {counts:?}");
    }

    #[tokio::test]
    async fn pool_preserves_membership_and_honors_limit() {
        let fixture = testutil::fixture().await;
        for i in 0..6 {
            testutil::insert_registration(&fixture, &format!("p{i}")).await;
        }

        let full = shuffled_pool(&fixture.pool, fixture.event.id, None, None)
            .await
            .unwrap();
        assert_eq!(full.len(), 6);

        let capped = shuffled_pool(&fixture.pool, fixture.event.id, None, Some(3))
            .await
            .unwrap();
        assert_eq!(capped.len(), 3);
        for entry in &capped {
            assert!(full.iter().any(|r| r.id == entry.id));
        }
    }

    #[tokio::test]
    async fn role_filter_restricts_pool() {
        let fixture = testutil::fixture().await;
        testutil::insert_registration(&fixture, "p1").await;

        let organizers = shuffled_pool(
            &fixture.pool,
            fixture.event.id,
            Some(crate::services::registration::ROLE_ORGANIZER),
            None,
        )
        .await
        .unwrap();
        assert!(organizers.is_empty());
    }
}
