use std::time::Duration;

/// Attempts to acquire (or steal, if expired) the named scheduler lock in one
/// atomic statement (spec §4.8, §4.9, §8 invariant 6). The `WHERE` clause on
/// the `DO UPDATE` branch means the upsert only lands when the existing row
/// is expired, so a live holder's row is left untouched and this returns
/// `false` for the loser of the race.
pub async fn try_acquire(pool: &sqlx::PgPool, lock_name: &str, ttl: Duration) -> sqlx::Result<bool> {
    let acquired: Option<String> = sqlx::query_scalar(
        r#"
        INSERT INTO scheduler_locks (lock_name, acquired_at, expires_at)
        VALUES ($1, now(), now() + $2::interval)
        ON CONFLICT (lock_name) DO UPDATE SET
            acquired_at = now(),
            expires_at = now() + $2::interval
        WHERE scheduler_locks.expires_at < now()
        RETURNING lock_name
        "#,
    )
    .bind(lock_name)
    .bind(format!("{} seconds", ttl.as_secs()))
    .fetch_optional(pool)
    .await?;
    let acquired = acquired.is_some();
    tracing::debug!(lock_name, acquired, "scheduler lock acquisition attempt");
    Ok(acquired)
}

/// Releases the lock. Best-effort in the caller's exit path (spec §7): a
/// failed release just means the lock expires naturally and is stolen later.
pub async fn release(pool: &sqlx::PgPool, lock_name: &str) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM scheduler_locks WHERE lock_name = $1")
        .bind(lock_name)
        .execute(pool)
        .await?;
    Ok(())
}
