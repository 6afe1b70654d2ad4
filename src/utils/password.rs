use tokio::task;

use crate::error::{AppError, AppResult};

// bcrypt is deliberately slow; keep it off the async worker threads.

pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_owned();
    task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(AppError::from)
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let matches = task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_is_salted_and_verifiable() {
        let first = hash_password("correct horse", 4 /* bcrypt minimum cost */).await.unwrap();
        let second = hash_password("correct horse", 4 /* bcrypt minimum cost */).await.unwrap();

        assert_ne!(first, second);
        assert!(!first.contains("correct horse"));
        assert!(verify_password("correct horse", &first).await.unwrap());
        assert!(!verify_password("wrong", &first).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "plaintext").await.unwrap());
    }
}
