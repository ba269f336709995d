//! # Function-backed service (`ServiceFn`)
//!
//! [`ServiceFn`] wraps a closure `F: Fn(CancellationToken) -> Fut` as a
//! [`Service`]: `start` runs the closure's future, `shutdown` cancels the token
//! that future was given. Useful for simple loops that only need cooperative
//! cancellation.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use procvisor::{ServiceError, ServiceFn, ServiceRef};
//!
//! let svc: ServiceRef = ServiceFn::arc("ticker", |ctx: CancellationToken| async move {
//!     while !ctx.is_cancelled() {
//!         tokio::time::sleep(Duration::from_millis(250)).await;
//!     }
//!     Ok::<_, ServiceError>(())
//! });
//!
//! assert_eq!(svc.name(), "ticker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::Service;
use crate::error::ServiceError;

/// Function-backed service.
pub struct ServiceFn<F> {
    name: Cow<'static, str>,
    f: F,
    stop: Mutex<Option<CancellationToken>>,
}

impl<F> ServiceFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            stop: Mutex::new(None),
        }
    }

    /// Creates the service as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Service for ServiceFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
        let token = ctx.child_token();
        *self.stop.lock() = Some(token.clone());
        (self.f)(token).await
    }

    async fn shutdown(&self, _deadline: Instant) -> Result<(), ServiceError> {
        if let Some(token) = self.stop.lock().take() {
            token.cancel();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn shutdown_cancels_the_running_future() {
        let svc = ServiceFn::arc("loop", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err(ServiceError::Canceled)
        });

        let runner = Arc::clone(&svc);
        let join = tokio::spawn(async move { runner.start(CancellationToken::new()).await });
        while svc.stop.lock().is_none() {
            tokio::task::yield_now().await;
        }

        svc.shutdown(Instant::now() + Duration::from_secs(1))
            .await
            .unwrap();
        let res = join.await.unwrap();
        assert!(matches!(res, Err(ServiceError::Canceled)));
    }
}
