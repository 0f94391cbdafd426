//! Top-level signalling context

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RoomlinkConfig;
use crate::dispatch::{self, Dispatcher, OperationQueue};
use crate::peer::session::MediaSessionFactory;
use crate::signaling::connection::Connection;
use crate::signaling::engine::SignallingEngine;
use crate::signaling::registry::AgentRegistry;
use crate::{Error, Result};

/// Owns the signalling engine, the callback registry, and the dispatch queue
///
/// One context per process is the expected shape; every [`Connection`] and
/// conference created through it shares the same dispatcher.
pub struct SignallingContext {
    engine: Arc<dyn SignallingEngine>,
    registry: Arc<AgentRegistry>,
    queue: OperationQueue,
    factory: Arc<dyn MediaSessionFactory>,
    config: RoomlinkConfig,
}

impl SignallingContext {
    /// Validate the configuration, start the engine, and return the context
    /// together with its dispatcher
    ///
    /// The caller decides how the dispatcher runs: spawn
    /// [`Dispatcher::run`] as a task, or pump [`Dispatcher::tick`] from a
    /// host update loop.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration or when the engine cannot start.
    pub async fn create(
        engine: Arc<dyn SignallingEngine>,
        factory: Arc<dyn MediaSessionFactory>,
        config: RoomlinkConfig,
    ) -> Result<(Self, Dispatcher)> {
        config.validate()?;

        engine
            .start()
            .await
            .map_err(|e| Error::ContextFailed(e.to_string()))?;
        info!("Signalling context created");

        let (queue, dispatcher) = dispatch::channel();
        let context = Self {
            engine,
            registry: Arc::new(AgentRegistry::new()),
            queue,
            factory,
            config,
        };
        Ok((context, dispatcher))
    }

    /// Connect using the configured signalling URL and domain
    ///
    /// # Errors
    ///
    /// See [`connect_with`](SignallingContext::connect_with).
    pub async fn connect(&self) -> Result<Connection> {
        self.connect_with(
            &self.config.signalling_url,
            &self.config.xmpp_domain,
            self.config.tls_insecure,
        )
        .await
    }

    /// Connect to an explicit deployment, overriding the configured one
    ///
    /// All-or-nothing: on failure no engine handle is retained and the
    /// context can retry immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionFailed`] when the engine cannot establish
    /// the connection.
    pub async fn connect_with(
        &self,
        url: &str,
        domain: &str,
        tls_insecure: bool,
    ) -> Result<Connection> {
        debug!(url, domain, "Connecting to signalling deployment");
        Connection::establish(
            Arc::clone(&self.engine),
            Arc::clone(&self.registry),
            self.queue.clone(),
            Arc::clone(&self.factory),
            url,
            domain,
            tls_insecure,
        )
        .await
    }
}

impl Drop for SignallingContext {
    fn drop(&mut self) {
        debug!("Shutting down signalling context");
        self.engine.shutdown();
    }
}
