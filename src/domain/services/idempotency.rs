use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::models::idempotency::IdempotencyClaim;
use crate::domain::ports::IdempotencyRepository;
use crate::error::AppError;

pub fn hash_payload(payload: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// At-most-once execution keyed by a caller-supplied key plus payload
/// hash. The first caller claims the key and runs `operation`; duplicates
/// with the same payload replay the stored response, in-flight duplicates
/// get a busy conflict, and a different payload under the same key is
/// rejected outright. A failed operation releases its claim so a retry
/// can run.
pub async fn run_with_idempotency<T, F, Fut>(
    repo: &dyn IdempotencyRepository,
    key: &str,
    handler: &str,
    payload: &serde_json::Value,
    operation: F,
) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let request_hash = hash_payload(payload);

    match repo.claim(key, handler, &request_hash).await? {
        IdempotencyClaim::Replay(stored) => serde_json::from_str(&stored)
            .map_err(|e| AppError::InternalWithMsg(format!("Corrupt idempotency response: {}", e))),
        IdempotencyClaim::Busy => Err(AppError::IdempotencyBusy),
        IdempotencyClaim::Conflict => Err(AppError::IdempotencyConflict),
        IdempotencyClaim::Fresh => match operation().await {
            Ok(result) => {
                let serialized = serde_json::to_string(&result)
                    .map_err(|e| AppError::InternalWithMsg(format!("Failed to serialize idempotent response: {}", e)))?;
                repo.store_response(key, &serialized).await?;
                Ok(result)
            }
            Err(err) => {
                repo.release(key).await?;
                Err(err)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_is_deterministic() {
        let a = hash_payload(&json!({"bookingId": "abc"}));
        let b = hash_payload(&json!({"bookingId": "abc"}));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn hash_differs_by_payload() {
        let a = hash_payload(&json!({"bookingId": "abc"}));
        let b = hash_payload(&json!({"bookingId": "def"}));
        assert_ne!(a, b);
    }
}
