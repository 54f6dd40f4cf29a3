use chrono::Utc;
use tokio::time::{interval, Duration};

use crate::{
    constants::PENDING_PREFIX,
    infrastructure::storage::{ObjectStorage, StorageError},
};

/// Hourly sweep that deletes uploads stranded under the pending prefix.
/// An object only stays there when a run died between upload and move, so
/// anything older than the retention window is garbage.
pub async fn start_pending_sweep_task<S: ObjectStorage>(storage: S, retention_hours: u64) {
    let mut interval = interval(Duration::from_secs(60 * 60));

    loop {
        interval.tick().await;

        match sweep_pending_uploads(&storage, retention_hours).await {
            Ok(count) => tracing::info!("Swept {} stale pending uploads", count),
            Err(e) => tracing::error!("Pending sweep failed: {}", e)
        }
    }
}

pub async fn sweep_pending_uploads<S: ObjectStorage>(
    storage: &S,
    retention_hours: u64,
) -> Result<usize, StorageError> {
    let cutoff = Utc::now().timestamp_millis() - (retention_hours as i64) * 60 * 60 * 1000;

    let keys = storage.list(PENDING_PREFIX).await?;
    let mut swept = 0;

    for key in keys {
        let Some(millis) = key_timestamp_millis(&key) else {
            tracing::warn!(key = %key, "Pending object with unparsable timestamp, skipping");
            continue;
        };

        if millis < cutoff {
            storage.delete(&key).await?;
            swept += 1;
        }
    }

    Ok(swept)
}

/// Keys are `<prefix>/<unix_millis>-<file_name>`; returns the millis part.
fn key_timestamp_millis(key: &str) -> Option<i64> {
    let name = key.rsplit('/').next()?;
    let (millis, _) = name.split_once('-')?;
    millis.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::MockObjectStorage;

    #[test]
    fn parses_timestamp_from_pending_key() {
        assert_eq!(key_timestamp_millis("uploads/1700000000000-photo.jpg"), Some(1700000000000));
        assert_eq!(key_timestamp_millis("uploads/not-a-number.jpg"), None);
        assert_eq!(key_timestamp_millis("uploads/noseparator"), None);
    }

    #[tokio::test]
    async fn sweeps_only_stale_keys() {
        let stale_key = format!("uploads/{}-old.jpg", Utc::now().timestamp_millis() - 48 * 60 * 60 * 1000);
        let fresh_key = format!("uploads/{}-new.jpg", Utc::now().timestamp_millis());

        let mut storage = MockObjectStorage::new();
        let keys = vec![stale_key.clone(), fresh_key];
        storage.expect_list()
            .times(1)
            .returning(move |_| Ok(keys.clone()));
        storage.expect_delete()
            .times(1)
            .withf(move |key| key == stale_key)
            .returning(|_| Ok(()));

        let swept = sweep_pending_uploads(&storage, 24).await.unwrap();
        assert_eq!(swept, 1);
    }

    #[tokio::test]
    async fn skips_unparsable_keys() {
        let mut storage = MockObjectStorage::new();
        storage.expect_list()
            .times(1)
            .returning(|_| Ok(vec!["uploads/garbage".to_string()]));
        storage.expect_delete().times(0);

        let swept = sweep_pending_uploads(&storage, 24).await.unwrap();
        assert_eq!(swept, 0);
    }
}
