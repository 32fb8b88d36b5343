//! Ordered fallback chains.
//!
//! A fallback chain is an ordered list of alternatives tried one after
//! another until one succeeds. Unlike a retry loop the same operation is not
//! repeated: each attempt receives a different strategy descriptor.
//!
//! # Example
//!
//! ```rust,no_run
//! use affiliate_auth::fallback::first_success;
//! use std::time::Duration;
//!
//! async fn example() {
//!     let mirrors = ["https://a.example.com", "https://b.example.com"];
//!
//!     let result = first_success(&mirrors, Duration::from_secs(1), |mirror| async move {
//!         if mirror.contains("b.") {
//!             Ok(mirror.len())
//!         } else {
//!             Err(format!("{} unavailable", mirror))
//!         }
//!     })
//!     .await;
//!
//!     assert!(result.is_ok());
//! }
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Every alternative in a chain failed.
///
/// Holds the error of each attempt in the order they were made.
#[derive(Debug)]
pub struct Exhausted<E> {
    /// Errors, one per attempt
    pub errors: Vec<E>,
}

impl<E> Exhausted<E> {
    /// Error of the final attempt, `None` for an empty chain.
    pub fn into_last(self) -> Option<E> {
        self.errors.into_iter().last()
    }

    /// Number of attempts made.
    pub fn attempts(&self) -> usize {
        self.errors.len()
    }
}

/// Try each strategy in order, stopping at the first success.
///
/// `spacing` is slept between consecutive attempts (never before the first).
/// Errors never abort the chain; they are collected and returned when all
/// strategies fail.
pub async fn first_success<'a, S, F, Fut, T, E>(
    strategies: &'a [S],
    spacing: Duration,
    mut attempt: F,
) -> Result<T, Exhausted<E>>
where
    F: FnMut(&'a S) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    let mut errors = Vec::with_capacity(strategies.len());

    for (index, strategy) in strategies.iter().enumerate() {
        if index > 0 && !spacing.is_zero() {
            sleep(spacing).await;
        }

        match attempt(strategy).await {
            Ok(result) => {
                if index > 0 {
                    tracing::info!(attempts = index + 1, "Fallback chain succeeded");
                }
                return Ok(result);
            }
            Err(e) => {
                tracing::warn!(
                    attempt = index + 1,
                    remaining = strategies.len() - index - 1,
                    error = ?e,
                    "Fallback attempt failed"
                );
                errors.push(e);
            }
        }
    }

    tracing::debug!(attempts = errors.len(), "Fallback chain exhausted");
    Err(Exhausted { errors })
}
