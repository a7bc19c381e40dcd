//! Broker client facade
//!
//! Thin construction layer: holds the node configuration and the shared
//! order-key generator, and provisions an independent working copy per
//! producer/consumer. All protocol logic lives in [`Producer`] and
//! [`Consumer`].

use std::sync::Arc;

use tempfile::TempDir;

use libgitmq_core::{BrokerConfig, OrderKeyGenerator};
use libgitmq_git::WorkingCopy;

use crate::{BrokerError, Consumer, Producer};

/// Entry point for one process talking to a broker repository.
pub struct BrokerClient {
    config: BrokerConfig,
    clock: Arc<OrderKeyGenerator>,
}

impl BrokerClient {
    /// Client with a system-clock order-key generator.
    pub fn new(config: BrokerConfig) -> Self {
        Self::with_clock(config, Arc::new(OrderKeyGenerator::new()))
    }

    /// Client with an explicit generator (deterministic tests, shared
    /// generators across clients of one process).
    pub fn with_clock(config: BrokerConfig, clock: Arc<OrderKeyGenerator>) -> Self {
        Self { config, clock }
    }

    /// Provision a producer for `topic`, publishing as `node`.
    pub fn create_producer(&self, topic: &str, node: &str) -> Result<Producer, BrokerError> {
        let (dir, copy) = self.provision(topic)?;
        Ok(Producer::new(
            copy,
            node.to_string(),
            Arc::clone(&self.clock),
            dir,
        ))
    }

    /// Provision a consumer for `topic`, checkpointing as `node`.
    pub fn create_consumer(&self, topic: &str, node: &str) -> Result<Consumer, BrokerError> {
        let (dir, copy) = self.provision(topic)?;
        Ok(Consumer::new(
            copy,
            node.to_string(),
            Arc::clone(&self.clock),
            dir,
        ))
    }

    fn provision(&self, topic: &str) -> Result<(TempDir, WorkingCopy), BrokerError> {
        let dir = TempDir::new().map_err(libgitmq_core::CoreError::Io)?;
        let copy = WorkingCopy::provision(
            dir.path(),
            &self.config.broker_url,
            topic,
            self.config.author.clone(),
            self.config.credentials.clone(),
        )?;
        Ok((dir, copy))
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }
}
