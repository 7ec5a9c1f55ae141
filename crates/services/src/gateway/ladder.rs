//! Model fallback ladder shared by both gateways.
//!
//! Candidates are tried in configuration order. A quota error earns exactly
//! one fixed-delay retry on the same model before falling through; any other
//! failure falls through immediately. Exhausting the list is a single
//! terminal error — no partial results.

use std::time::Duration;

use crate::error::GatewayError;

pub(crate) async fn run<T, F, Fut>(
    models: &[String],
    retry_delay: Duration,
    mut attempt: F,
) -> Result<T, GatewayError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    for model in models {
        match attempt(model.clone()).await {
            Ok(value) => return Ok(value),
            Err(GatewayError::RateLimited { .. }) => {
                log::warn!(
                    "model {model} out of quota, retrying once in {}s",
                    retry_delay.as_secs()
                );
                tokio::time::sleep(retry_delay).await;
                match attempt(model.clone()).await {
                    Ok(value) => return Ok(value),
                    Err(err) => log::warn!("model {model} failed after retry: {err}"),
                }
            }
            Err(err) => log::warn!("model {model} failed: {err}"),
        }
    }

    Err(GatewayError::Exhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|m| (*m).to_string()).collect()
    }

    #[tokio::test]
    async fn first_success_wins() {
        let calls = RefCell::new(Vec::new());
        let result = run(&models(&["a", "b"]), Duration::ZERO, |model| {
            calls.borrow_mut().push(model.clone());
            async move { Ok::<_, GatewayError>(model) }
        })
        .await
        .unwrap();

        assert_eq!(result, "a");
        assert_eq!(*calls.borrow(), vec!["a"]);
    }

    #[tokio::test]
    async fn quota_error_gets_one_retry_on_same_model() {
        let calls = RefCell::new(Vec::new());
        let result = run(&models(&["a", "b"]), Duration::ZERO, |model| {
            calls.borrow_mut().push(model.clone());
            async move {
                if model == "a" {
                    Err(GatewayError::RateLimited { model })
                } else {
                    Ok(model)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "b");
        // "a" attempted twice (initial + retry), then fall through to "b".
        assert_eq!(*calls.borrow(), vec!["a", "a", "b"]);
    }

    #[tokio::test]
    async fn retry_success_stops_the_ladder() {
        let calls = RefCell::new(0_u32);
        let result = run(&models(&["a", "b"]), Duration::ZERO, |model| {
            *calls.borrow_mut() += 1;
            let attempt = *calls.borrow();
            async move {
                if attempt == 1 {
                    Err(GatewayError::RateLimited { model })
                } else {
                    Ok(model)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "a");
        assert_eq!(*calls.borrow(), 2);
    }

    #[tokio::test]
    async fn permanent_failure_skips_without_retry() {
        let calls = RefCell::new(Vec::new());
        let result = run(&models(&["a", "b"]), Duration::ZERO, |model| {
            calls.borrow_mut().push(model.clone());
            async move {
                if model == "a" {
                    Err(GatewayError::HttpStatus(
                        reqwest::StatusCode::NOT_FOUND,
                    ))
                } else {
                    Ok(model)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "b");
        assert_eq!(*calls.borrow(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn exhausting_every_candidate_is_terminal() {
        let calls = RefCell::new(0_u32);
        let err = run(&models(&["a", "b", "c"]), Duration::ZERO, |_model| {
            *calls.borrow_mut() += 1;
            async move {
                Err::<(), _>(GatewayError::HttpStatus(
                    reqwest::StatusCode::BAD_REQUEST,
                ))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, GatewayError::Exhausted));
        assert_eq!(*calls.borrow(), 3);
    }

    #[tokio::test]
    async fn empty_ladder_is_exhausted_immediately() {
        let err = run(&[], Duration::ZERO, |model: String| async move {
            Ok::<_, GatewayError>(model)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::Exhausted));
    }
}
