//! ## unreal-control::server
//! **Background HTTP(S) listener**
//!
//! The server runs on its own thread with a small tokio runtime, so the frame
//! loop stays synchronous. Requests only ever reach the clock through the
//! shared [`ControlState`].

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use rustls::ServerConfig;
use tracing::{error, info, warn};

use unreal_config::ControlConfig;

use crate::router::{control_router, ControlState};
use crate::{tls, ControlError};

const WORKER_THREADS: usize = 2;

struct Running {
    handle: Handle,
    thread: JoinHandle<()>,
    local_addr: SocketAddr,
}

pub struct ControlServer {
    config: ControlConfig,
    state: Arc<ControlState>,
    running: Option<Running>,
}

impl ControlServer {
    pub fn new(config: ControlConfig, state: ControlState) -> Self {
        Self {
            config,
            state: Arc::new(state),
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Address actually bound, which differs from the configured one for port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    /// Binds the listener and starts serving in the background.
    pub fn run(&mut self) -> Result<SocketAddr, ControlError> {
        if self.running.is_some() {
            return Err(ControlError::AlreadyRunning);
        }

        let tls = self.config.tls.as_ref().map(tls::server_config).transpose()?;
        let listener = TcpListener::bind(self.config.bind).map_err(|source| ControlError::Bind {
            addr: self.config.bind,
            source,
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let router = control_router(&self.config, Arc::clone(&self.state));
        let handle = Handle::new();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name("control-worker")
            .enable_all()
            .build()?;

        let server_handle = handle.clone();
        let secure = tls.is_some();
        let thread = thread::Builder::new()
            .name("control-server".into())
            .spawn(move || runtime.block_on(serve(listener, router, server_handle, tls)))?;

        info!(%local_addr, tls = secure, assets = self.config.assets.len(), "Control server listening");
        self.running = Some(Running {
            handle,
            thread,
            local_addr,
        });
        Ok(local_addr)
    }

    /// Stops accepting, waits up to the grace period for open connections
    /// and joins the server thread. Does nothing when not running.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let grace = Duration::from_millis(self.config.shutdown_grace_ms);
        info!(?grace, "Stopping control server");
        running.handle.graceful_shutdown(Some(grace));
        if running.thread.join().is_err() {
            error!("Control server thread panicked");
        }
        info!("Control server stopped");
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn serve(
    listener: TcpListener,
    router: Router,
    handle: Handle,
    tls: Option<Arc<ServerConfig>>,
) {
    let app = router.into_make_service();
    let result = match tls {
        Some(config) => {
            axum_server::from_tcp_rustls(listener, RustlsConfig::from_config(config))
                .handle(handle)
                .serve(app)
                .await
        }
        None => axum_server::from_tcp(listener).handle(handle).serve(app).await,
    };
    if let Err(err) = result {
        warn!(%err, "Control server exited with an error");
    }
}
