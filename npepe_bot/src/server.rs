//! The HTTP side of the bot: a liveness page and a health check that also
//! nudges the scheduler, so an external pinger keeps the jobs on time even
//! on hosts that put idle processes to sleep.

use std::{future::Future, sync::Arc};

use axum::{extract::State, http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;

use crate::scheduler::Scheduler;

const INDEX_TEXT: &str = "🐸 NPEPE Telegram Bot is live!";

/// Routes for `/` and `/health`. Without a scheduler the health check only
/// reports liveness.
pub fn router(scheduler: Option<Arc<Scheduler>>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .with_state(scheduler)
}

async fn index() -> &'static str {
    INDEX_TEXT
}

async fn health(State(scheduler): State<Option<Arc<Scheduler>>>) -> StatusCode {
    if let Some(scheduler) = scheduler {
        tokio::spawn(async move { scheduler.poll().await });
    }
    StatusCode::NO_CONTENT
}

/// Take `port` on all interfaces.
pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Serve `app` on `listener` until `shutdown` completes.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Serve only the liveness routes until Ctrl+C. Used when the bot itself
/// couldn't start, so the host still sees a live process.
pub async fn serve_degraded(port: u16) -> std::io::Result<()> {
    log::warn!("Serving in degraded mode, the bot is not running.");
    serve(bind(port).await?, router(None), async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::context::tests::memory_context;

    async fn get_status(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn index_says_hi() {
        let (status, body) = get_status(router(None), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("NPEPE Telegram Bot is live"));
    }

    #[tokio::test]
    async fn health_is_empty() {
        let (status, body) = get_status(router(None), "/health").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let context = Arc::new(memory_context(&[]).await);
        let scheduler = Arc::new(Scheduler::new(teloxide::Bot::new("123:abc"), context));
        let (status, _) = get_status(router(Some(scheduler)), "/health").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn taken_port_fails_to_bind() {
        let taken = TcpListener::bind(("0.0.0.0", 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let error = bind(port).await.unwrap_err();
        assert_eq!(error.kind(), std::io::ErrorKind::AddrInUse);
        assert_eq!(
            serve_degraded(port).await.unwrap_err().kind(),
            std::io::ErrorKind::AddrInUse
        );
    }

    #[tokio::test]
    async fn bound_listener_serves_the_routes() {
        let listener = bind(0).await.unwrap();
        let address = listener.local_addr().unwrap();
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, router(None), async {
            let _ = stopped.await;
        }));

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let body = client
            .get(format!("http://127.0.0.1:{}/", address.port()))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, INDEX_TEXT);

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let (status, _) = get_status(router(None), "/webhook").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
