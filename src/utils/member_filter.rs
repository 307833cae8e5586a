use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// A lab roster is small; headroom is for multi-tenant growth.
const FILTER_CAPACITY: usize = 50_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static MEMBER_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check if a member email might exist (false positives possible).
/// A negative answer is definitive and lets the dispatcher skip the
/// cache and database entirely.
pub fn might_exist(email: &str) -> bool {
    let email = normalize(email);
    MEMBER_FILTER
        .read()
        .expect("member filter poisoned")
        .contains(&email)
}

/// Insert a single member email into the filter
pub fn insert(email: &str) {
    let email = normalize(email);
    MEMBER_FILTER
        .write()
        .expect("member filter poisoned")
        .add(&email);
}

/// Remove a member email from the filter
pub fn remove(email: &str) {
    let email = normalize(email);
    MEMBER_FILTER
        .write()
        .expect("member filter poisoned")
        .remove(&email);
}

/// Warm up the member-email filter using streaming + batching
pub async fn warmup_member_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String,)>("SELECT email FROM team_members").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (email,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&email));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Member filter warmup complete: {} members", total);
    Ok(())
}

/// Insert a batch of normalized emails
fn insert_batch(emails: &[String]) {
    let mut filter = MEMBER_FILTER.write().expect("member filter poisoned");

    for email in emails {
        filter.add(email);
    }
}
