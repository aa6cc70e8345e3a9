//! Legal-case sync job (C8, spec §4.8): a cron-triggered, single-execution
//! job that refreshes stale legal cases from the judicial API.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fishsub_core::config::SchedulerConfig;
use fishsub_legalcase::LegalCaseProvider;
use tracing::{info, warn};

const LOCK_NAME: &str = "update_legal_cases_cron";

/// Default cadence of the sync job (spec §4.8: "every three days at midnight
/// of a configured timezone").
pub const SYNC_PERIOD_DAYS: i64 = 3;

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct SyncSummary {
    pub candidates: usize,
    pub updated: usize,
    pub skipped: usize,
    pub new_movements: usize,
    pub field_changes: usize,
    pub errors: Vec<String>,
}

/// Runs one sync pass: acquires the distributed lock, selects stale cases,
/// and updates each under the configured rate limit. Returns `None` without
/// doing any work if another process currently holds the lock.
pub async fn run_once(
    pool: &sqlx::PgPool,
    provider: &dyn LegalCaseProvider,
    config: &SchedulerConfig,
) -> Option<SyncSummary> {
    match fishsub_db::scheduler_lock::try_acquire(pool, LOCK_NAME, config.lock_ttl).await {
        Ok(true) => {}
        Ok(false) => {
            info!("legal case sync skipped: lock held by another process");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "failed to attempt scheduler lock acquisition");
            return None;
        }
    }

    fishsub_core::metrics::METRICS.legal_case_sync_runs.inc();
    let summary = sync_stale_cases(pool, provider, config).await;

    if let Err(e) = fishsub_db::scheduler_lock::release(pool, LOCK_NAME).await {
        warn!(error = %e, "failed to release scheduler lock; it will expire naturally");
    }

    Some(summary)
}

async fn sync_stale_cases(
    pool: &sqlx::PgPool,
    provider: &dyn LegalCaseProvider,
    config: &SchedulerConfig,
) -> SyncSummary {
    let cases = match fishsub_db::legal_cases::select_stale(pool, config.batch_size, config.stale_after_days).await {
        Ok(cases) => cases,
        Err(e) => {
            return SyncSummary {
                errors: vec![format!("failed to select stale cases: {e}")],
                ..Default::default()
            };
        }
    };

    let mut summary = SyncSummary {
        candidates: cases.len(),
        ..Default::default()
    };

    let min_interval = config.min_call_interval();
    let mut last_call = None::<tokio::time::Instant>;

    for case in cases {
        if let Some(last) = last_call {
            let elapsed = last.elapsed();
            if elapsed < min_interval {
                tokio::time::sleep(min_interval - elapsed).await;
            }
        }
        last_call = Some(tokio::time::Instant::now());

        match update_one_case(pool, provider, &case).await {
            Ok(UpdateOutcome::Skipped) => {
                summary.skipped += 1;
                fishsub_core::metrics::METRICS.legal_case_sync_skipped.inc();
            }
            Ok(UpdateOutcome::Updated {
                new_movements,
                field_changes,
            }) => {
                summary.updated += 1;
                summary.new_movements += new_movements;
                summary.field_changes += field_changes;
                fishsub_core::metrics::METRICS.legal_case_sync_updated.inc();
            }
            Err(e) => {
                summary.errors.push(format!("{}: {e}", case.numero_processo));
                fishsub_core::metrics::METRICS.legal_case_sync_errors.inc();
            }
        }
    }

    summary
}

enum UpdateOutcome {
    Skipped,
    Updated {
        new_movements: usize,
        field_changes: usize,
    },
}

fn court_acronym_from_case(case: &fishsub_core::entities::LegalCase) -> String {
    case.court.to_lowercase()
}

fn count_field_changes(before: &fishsub_core::entities::LegalCase, after: &fishsub_core::entities::LegalCase) -> usize {
    [
        before.body != after.body,
        before.class != after.class,
        before.subject != after.subject,
        before.status != after.status,
        before.filing_date != after.filing_date,
    ]
    .into_iter()
    .filter(|changed| *changed)
    .count()
}

async fn update_one_case(
    pool: &sqlx::PgPool,
    provider: &dyn LegalCaseProvider,
    existing: &fishsub_core::entities::LegalCase,
) -> fishsub_core::Result<UpdateOutcome> {
    let court = court_acronym_from_case(existing);
    let fresh = provider
        .find_case(&existing.numero_processo, &court)
        .await?;

    let Some((fresh, fresh_movements)) = fresh else {
        return Ok(UpdateOutcome::Skipped);
    };

    let existing_movements = fishsub_db::legal_cases::list_movements(pool, existing.id)
        .await
        .map_err(|e| fishsub_core::Error::LegalCasePersistence(anyhow::anyhow!(e)))?;
    let known: std::collections::HashSet<(chrono::DateTime<chrono::Utc>, String)> = existing_movements
        .iter()
        .map(|m| (m.movement_date, m.description.clone()))
        .collect();

    let new_movements: Vec<_> = fresh_movements
        .into_iter()
        .filter(|m| !known.contains(m))
        .collect();

    let field_changes = count_field_changes(existing, &fresh);

    let update = fishsub_db::legal_cases::CaseFieldUpdate {
        body: fresh.body.clone(),
        class: fresh.class.clone(),
        subject: fresh.subject.clone(),
        status: fresh.status.clone(),
        filing_date: fresh.filing_date,
        movimentacoes: fresh.movimentacoes,
        ultima_movimentacao: fresh.ultima_movimentacao,
        ultima_movimentacao_descricao: fresh.ultima_movimentacao_descricao.clone(),
    };

    fishsub_db::legal_cases::apply_case_updates(pool, existing.id, update, &new_movements)
        .await
        .map_err(|e| fishsub_core::Error::LegalCasePersistence(anyhow::anyhow!(e)))?;

    Ok(UpdateOutcome::Updated {
        new_movements: new_movements.len(),
        field_changes,
    })
}

/// Resolves the configured IANA timezone name, falling back to UTC (with a
/// warning) if it doesn't parse.
fn resolve_timezone(name: &str) -> chrono_tz::Tz {
    name.parse().unwrap_or_else(|_| {
        warn!(timezone = name, "unrecognised scheduler timezone, falling back to UTC");
        chrono_tz::UTC
    })
}

/// The instant (in UTC) corresponding to local midnight on `date` in `tz`.
/// DST gaps/ambiguities fall back to the earlier of the two candidate
/// instants rather than failing the tick.
fn local_midnight_utc(date: NaiveDate, tz: chrono_tz::Tz) -> DateTime<Utc> {
    let naive_midnight = date.and_hms_opt(0, 0, 0).expect("midnight is always a valid time");
    match tz.from_local_datetime(&naive_midnight) {
        chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
        chrono::LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        chrono::LocalResult::None => naive_midnight.and_utc(),
    }
}

/// Drives `run_once` at local midnight in `config.timezone`, every
/// `period_days` days, until `shutdown` resolves (spec §4.8).
pub async fn run_forever(
    pool: sqlx::PgPool,
    provider: std::sync::Arc<dyn LegalCaseProvider>,
    config: SchedulerConfig,
    period_days: i64,
    shutdown: impl std::future::Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    let tz = resolve_timezone(&config.timezone);
    let period_days = period_days.max(1);
    let mut next_fire_date = Utc::now().with_timezone(&tz).date_naive().succ_opt().expect("date does not overflow");

    loop {
        let next_fire_at = local_midnight_utc(next_fire_date, tz);
        let delay = (next_fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                if let Some(summary) = run_once(&pool, provider.as_ref(), &config).await {
                    info!(
                        candidates = summary.candidates,
                        updated = summary.updated,
                        skipped = summary.skipped,
                        errors = summary.errors.len(),
                        "legal case sync pass complete"
                    );
                }
                next_fire_date = next_fire_date + chrono::Duration::days(period_days);
            }
            _ = &mut shutdown => {
                info!("legal case sync job shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishsub_core::entities::LegalCase;
    use pretty_assertions::assert_eq;

    fn sample_case(numero: &str) -> LegalCase {
        LegalCase {
            id: uuid::Uuid::new_v4(),
            numero_processo: numero.to_string(),
            court: "TJAL".to_string(),
            body: None,
            class: None,
            subject: None,
            status: None,
            filing_date: None,
            movimentacoes: 0,
            ultima_movimentacao: None,
            ultima_movimentacao_descricao: None,
            last_synced_at: None,
        }
    }

    #[test]
    fn field_change_count_ignores_unchanged_fields() {
        let before = sample_case("0710802-55.2018.8.02.0001");
        let mut after = before.clone();
        after.status = Some("baixado".to_string());
        assert_eq!(count_field_changes(&before, &after), 1);
    }

    #[test]
    fn court_acronym_lowercases_the_tribunal_code() {
        let case = sample_case("0710802-55.2018.8.02.0001");
        assert_eq!(court_acronym_from_case(&case), "tjal");
    }

    #[test]
    fn local_midnight_utc_converts_sao_paulo_offset() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let midnight = local_midnight_utc(date, chrono_tz::America::Sao_Paulo);
        assert_eq!(midnight.to_rfc3339(), "2026-03-10T03:00:00+00:00");
    }

    #[test]
    fn resolve_timezone_falls_back_to_utc_for_unknown_name() {
        assert_eq!(resolve_timezone("Not/A_Zone"), chrono_tz::UTC);
    }
}
