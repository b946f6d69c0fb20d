//! Blocking adapter over the async client
//!
//! For callers without a Tokio runtime. Each call drives the async client
//! on a private current-thread runtime; do not use it from inside another
//! runtime.

use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use domain_invoice::{Invoice, SupplierRecord};

use crate::client::{ErpClient, SubmissionReceipt};
use crate::config::ErpClientConfig;
use crate::error::ErpError;
use crate::observer::OutcomeObserver;

pub struct BlockingErpClient {
    inner: ErpClient,
    runtime: Runtime,
}

impl BlockingErpClient {
    pub fn from_config(config: &ErpClientConfig) -> Result<Self, ErpError> {
        Self::new(ErpClient::from_config(config)?)
    }

    /// Wraps an existing async client
    pub fn new(inner: ErpClient) -> Result<Self, ErpError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ErpError::Configuration(format!("failed to start runtime: {}", e)))?;
        Ok(Self { inner, runtime })
    }

    pub fn with_observer(self, observer: Arc<dyn OutcomeObserver>) -> Self {
        Self {
            inner: self.inner.with_observer(observer),
            runtime: self.runtime,
        }
    }

    pub fn submit_invoice(&self, invoice: &Invoice) -> Result<SubmissionReceipt, ErpError> {
        self.runtime.block_on(self.inner.submit_invoice(invoice))
    }

    pub fn get_suppliers(&self) -> Result<Vec<SupplierRecord>, ErpError> {
        self.runtime.block_on(self.inner.get_suppliers())
    }

    pub fn close(&self) {
        self.runtime.block_on(self.inner.close())
    }

    pub fn inner(&self) -> &ErpClient {
        &self.inner
    }
}

impl std::fmt::Debug for BlockingErpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingErpClient")
            .field("inner", &self.inner)
            .finish()
    }
}
