use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// email (lowercased) => display name
pub static MEMBER_NAME_CACHE: Lazy<Cache<String, String>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Remember a member's display name
pub async fn remember(email: &str, name: &str) {
    MEMBER_NAME_CACHE
        .insert(email.trim().to_lowercase(), name.to_string())
        .await;
}

/// Cached display name, if we have seen this member recently
pub async fn display_name(email: &str) -> Option<String> {
    MEMBER_NAME_CACHE.get(&email.trim().to_lowercase()).await
}

/// Drop a member from the cache (on email change or deletion)
pub async fn forget(email: &str) {
    MEMBER_NAME_CACHE
        .invalidate(&email.trim().to_lowercase())
        .await;
}

/// Batch insert (email, name) pairs
async fn batch_remember(members: &[(String, String)]) {
    let futures: Vec<_> = members
        .iter()
        .map(|(email, name)| MEMBER_NAME_CACHE.insert(email.to_lowercase(), name.clone()))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load active members into the in-memory cache (batched)
pub async fn warmup_member_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT email, name
        FROM team_members
        WHERE status = 'active'
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (email, name) = row?;
        batch.push((email, name));
        total_count += 1;

        if batch.len() >= batch_size {
            batch_remember(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_remember(&batch).await;
    }

    log::info!("Member cache warmup complete: {} active members", total_count);

    Ok(())
}
