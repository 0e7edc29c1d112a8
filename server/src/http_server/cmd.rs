use std::net::SocketAddr;

use axum::Router;
use color_eyre::eyre::WrapErr as _;
use color_eyre::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use super::{routes, trace::Tracer};
use crate::AppState;

pub(crate) async fn serve() -> Result<()> {
    let app_state = AppState::from_env().await?;
    let port = app_state.app.port;

    let router = routes::make_router(&app_state.app).with_state(app_state);

    run_server(router, port).await?;

    info!("Main Returning");

    Ok(())
}

pub(crate) async fn run_server(routes: Router, port: u16) -> Result<()> {
    let tracer = Tracer;
    let trace_layer = tower_http::trace::TraceLayer::new_for_http()
        .make_span_with(tracer)
        .on_response(tracer);

    let app = routes.layer(trace_layer);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting server on port {}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err("Failed to open port")?;

    let addr = listener.local_addr()?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Failed to run server")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = ?err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
