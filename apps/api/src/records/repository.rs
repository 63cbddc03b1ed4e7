use anyhow::{bail, Result};
use sqlx::PgPool;
use tracing::info;

use crate::models::log_entry::TranscriptionRow;
use crate::models::LogEntry;

/// Loads the hosted transcriptions table and maps every row into LogEntry shape.
/// The table is read-only from this service.
pub async fn load_transcriptions(pool: &PgPool, table: &str) -> Result<Vec<LogEntry>> {
    if !is_valid_identifier(table) {
        bail!("Invalid records table name '{table}'");
    }

    let rows = sqlx::query_as::<_, TranscriptionRow>(&format!(
        r#"
        SELECT id, created_at, video_title, location, category, activity_type, notes,
               material, equipment, personnel, media_url, latitude, longitude,
               episode_id, status, reference_id
        FROM {table}
        ORDER BY created_at ASC
        "#
    ))
    .fetch_all(pool)
    .await?;

    info!(rows = rows.len(), table, "Loaded records table");
    Ok(rows.into_iter().map(TranscriptionRow::into_entry).collect())
}

/// Table names are interpolated into SQL, so only plain identifiers are accepted.
fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("transcriptions"));
        assert!(is_valid_identifier("site_logs_2024"));
        assert!(!is_valid_identifier("logs; DROP TABLE x"));
        assert!(!is_valid_identifier("1logs"));
        assert!(!is_valid_identifier(""));
    }
}
