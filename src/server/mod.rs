// src/server/mod.rs

//! Server-side components.
//!
//! This module contains:
//! - `session`  → Line framing and request/response loop for one connection
//! - `logging`  → Session spans, lifecycle events, subscriber setup
//!
//! [`ActivationServer`] accepts connections strictly one at a time: the next
//! client is not accepted until the current session has ended.

pub mod logging;
pub mod session;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, Instrument};

use crate::config::ServerConfig;
use crate::errors::RegistResult;
use crate::pipeline::ActivationPipeline;

pub use logging::{generate_session_id, init_logging, log_session_event, SessionEvent};
pub use session::{serve, SessionEnd, SessionOptions, READ_CHUNK_SIZE};

/// Sequential TCP activation server.
pub struct ActivationServer {
    listener: TcpListener,
    pipeline: ActivationPipeline,
    options: SessionOptions,
}

impl ActivationServer {
    /// Bind to `config.host:config.port`.
    pub async fn bind(config: &ServerConfig, pipeline: ActivationPipeline) -> RegistResult<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        Ok(Self::from_listener(
            listener,
            pipeline,
            SessionOptions::from(config),
        ))
    }

    pub fn from_listener(
        listener: TcpListener,
        pipeline: ActivationPipeline,
        options: SessionOptions,
    ) -> Self {
        Self {
            listener,
            pipeline,
            options,
        }
    }

    pub fn local_addr(&self) -> RegistResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept one connection and serve it to completion.
    pub async fn serve_next(&self) -> RegistResult<SessionEnd> {
        let (stream, peer) = self.listener.accept().await?;
        let session_id = generate_session_id();
        let span = logging::session_span(&session_id, &peer);

        async {
            log_session_event(SessionEvent::Connected, None);
            serve(stream, &self.pipeline, &self.options).await
        }
        .instrument(span)
        .await
    }

    /// Serve sessions forever, one after another.
    ///
    /// Failures of a single session or accept call are logged and the loop
    /// moves on to the next connection.
    pub async fn run(&self) -> RegistResult<()> {
        loop {
            if let Err(e) = self.serve_next().await {
                error!(error = %e, "Session ended with an error");
            }
        }
    }
}
