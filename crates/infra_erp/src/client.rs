//! ERP client facade
//!
//! Each submission moves through
//! `Encoding → Authenticating → Sending (⇄ retry wait) → Decoding` and ends
//! in success or failure. The observer hears about the outcome once.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, instrument};

use domain_invoice::{Invoice, SupplierRecord};

use crate::auth::{AuthSession, TokenProvider, TOKEN_PARAM};
use crate::codec;
use crate::config::{Credentials, ErpClientConfig};
use crate::error::{ErpError, TransportError};
use crate::observer::OutcomeObserver;
use crate::retry::{http_error, RetryExecutor, RetryPolicy};
use crate::transport::{ErpRequest, ErpResponse, HttpTransport, ReqwestTransport};

/// Incoming invoice import endpoint
pub const IMPORT_PATH: &str = "/resto/api/documents/import/incomingInvoice";

/// Supplier directory endpoint
pub const SUPPLIERS_PATH: &str = "/resto/api/suppliers";

const XML_CONTENT_TYPE: &str = "application/xml";

/// Stage of a single submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Encoding,
    Authenticating,
    Sending,
    Decoding,
    Succeeded,
    Failed,
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionState::Encoding => "encoding",
            SubmissionState::Authenticating => "authenticating",
            SubmissionState::Sending => "sending",
            SubmissionState::Decoding => "decoding",
            SubmissionState::Succeeded => "succeeded",
            SubmissionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Number assigned by the ERP, when it returns one
    pub document_number: Option<String>,
    /// Document number sent with the invoice
    pub invoice_number: String,
    /// Wall time from encoding to decoded response
    pub elapsed: Duration,
}

/// Client for the ERP invoice import API
pub struct ErpClient {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenProvider>,
    executor: RetryExecutor,
    observer: Option<Arc<dyn OutcomeObserver>>,
    closed: AtomicBool,
}

impl ErpClient {
    /// Builds a client with a pooled HTTPS transport
    pub fn from_config(config: &ErpClientConfig) -> Result<Self, ErpError> {
        config.validate()?;
        let transport = ReqwestTransport::new(
            config.normalized_base_url(),
            config.timeout(),
            config.verify_ssl,
        )
        .map_err(|e| ErpError::Configuration(e.to_string()))?;

        info!(
            base_url = %config.normalized_base_url(),
            verify_ssl = config.verify_ssl,
            "ERP client initialised"
        );
        Self::with_transport(config, Arc::new(transport))
    }

    /// Builds a client over an existing transport
    ///
    /// The configuration is validated the same way as in `from_config`.
    pub fn with_transport(
        config: &ErpClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ErpError> {
        config.validate()?;
        let credentials = Credentials::from_config(config)?;
        let tokens = Arc::new(AuthSession::with_lifetime(
            transport.clone(),
            credentials,
            config.token_ttl(),
            config.token_refresh_threshold(),
        ));
        Ok(Self::from_parts(transport, tokens, config.retry_policy()))
    }

    /// Assembles a client from its collaborators
    pub fn from_parts(
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenProvider>,
        policy: RetryPolicy,
    ) -> Self {
        let executor = RetryExecutor::new(transport.clone(), tokens.clone(), policy);
        Self {
            transport,
            tokens,
            executor,
            observer: None,
            closed: AtomicBool::new(false),
        }
    }

    /// Registers the outcome observer
    pub fn with_observer(mut self, observer: Arc<dyn OutcomeObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Runs `f` with a fresh client and closes it afterwards, whatever the result
    pub async fn scoped<F, Fut, T>(config: &ErpClientConfig, f: F) -> Result<T, ErpError>
    where
        F: FnOnce(Arc<ErpClient>) -> Fut,
        Fut: Future<Output = Result<T, ErpError>>,
    {
        let client = Arc::new(Self::from_config(config)?);
        let result = f(client.clone()).await;
        client.close().await;
        result
    }

    /// Token source shared with the retry executor
    pub fn token_provider(&self) -> Arc<dyn TokenProvider> {
        self.tokens.clone()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.executor.policy()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Submits an incoming invoice
    ///
    /// # Errors
    ///
    /// - `Validation` if the invoice cannot be encoded or the ERP rejects it
    /// - `Auth`, `Http`, `Network`, `RetryExhausted` per the retry rules
    #[instrument(skip_all, fields(invoice_number = %invoice.document_number()))]
    pub async fn submit_invoice(&self, invoice: &Invoice) -> Result<SubmissionReceipt, ErpError> {
        let started = Instant::now();
        let result = self.run_submission(invoice, started).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(receipt) => info!(
                state = %SubmissionState::Succeeded,
                document_number = receipt.document_number.as_deref().unwrap_or("-"),
                elapsed_ms = elapsed.as_millis() as u64,
                "Invoice submitted"
            ),
            Err(err) => error!(
                state = %SubmissionState::Failed,
                error = %err,
                elapsed_ms = elapsed.as_millis() as u64,
                "Invoice submission failed"
            ),
        }

        if let Some(observer) = &self.observer {
            observer.on_result(result.is_ok(), elapsed, result.as_ref().err());
        }
        result
    }

    async fn run_submission(
        &self,
        invoice: &Invoice,
        started: Instant,
    ) -> Result<SubmissionReceipt, ErpError> {
        self.ensure_open()?;

        debug!(state = %SubmissionState::Encoding, items = invoice.items().len());
        let xml = codec::encode(invoice)?;
        debug!(payload = %xml, "Encoded invoice");

        debug!(state = %SubmissionState::Authenticating);
        let token = self.tokens.get_token().await?;

        debug!(state = %SubmissionState::Sending);
        let request = ErpRequest::post(IMPORT_PATH, xml, XML_CONTENT_TYPE).with_query(TOKEN_PARAM, token);
        let response = self.executor.execute(request).await?;

        debug!(state = %SubmissionState::Decoding, status = response.status);
        let outcome = codec::decode(&expect_ok(response)?.body)?;
        if !outcome.valid {
            return Err(ErpError::Validation(outcome.rejection_reason().to_string()));
        }

        Ok(SubmissionReceipt {
            document_number: outcome.document_number,
            invoice_number: invoice.document_number().to_string(),
            elapsed: started.elapsed(),
        })
    }

    /// Lists suppliers known to the ERP
    #[instrument(skip(self))]
    pub async fn get_suppliers(&self) -> Result<Vec<SupplierRecord>, ErpError> {
        self.ensure_open()?;

        let token = self.tokens.get_token().await?;
        let request = ErpRequest::get(SUPPLIERS_PATH).with_query(TOKEN_PARAM, token);
        let response = expect_ok(self.executor.execute(request).await?)?;

        let suppliers = codec::decode_suppliers(&response.body)?;
        info!(count = suppliers.len(), "Retrieved suppliers");
        Ok(suppliers)
    }

    /// Releases the connection pool. Safe to call more than once.
    pub async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.transport.close().await;
            info!("ERP client closed");
        }
    }

    fn ensure_open(&self) -> Result<(), ErpError> {
        if self.is_closed() {
            return Err(ErpError::Network(TransportError::Closed));
        }
        Ok(())
    }
}

impl fmt::Debug for ErpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErpClient")
            .field("policy", &self.executor.policy())
            .field("has_observer", &self.observer.is_some())
            .field("closed", &self.is_closed())
            .finish()
    }
}

// The ERP answers imports with exactly 200
fn expect_ok(response: ErpResponse) -> Result<ErpResponse, ErpError> {
    if response.status == 200 {
        Ok(response)
    } else {
        Err(http_error(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AUTH_PATH;
    use crate::error::ErrorKind;
    use crate::observer::SubmissionStats;
    use crate::transport::mock::{Reply, ScriptedTransport};
    use std::sync::Mutex;
    use test_utils::InvoiceFixtures;

    const VALID: &str = "<documentValidationResult><valid>true</valid><documentNumber>ERP-77</documentNumber></documentValidationResult>";

    fn client(stub: &Arc<ScriptedTransport>) -> ErpClient {
        stub.always(AUTH_PATH, Reply::Respond(ErpResponse::new(200, "tok")));
        let config = ErpClientConfig::new("https://erp.test", "admin").with_password("secret");
        ErpClient::with_transport(&config, stub.clone()).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        outcomes: Mutex<Vec<(bool, Option<ErrorKind>)>>,
    }

    impl OutcomeObserver for Recorder {
        fn on_result(&self, success: bool, _elapsed: Duration, error: Option<&ErpError>) {
            self.outcomes
                .lock()
                .unwrap()
                .push((success, error.map(ErpError::kind)));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_success() {
        let stub = Arc::new(ScriptedTransport::new());
        stub.respond(IMPORT_PATH, 200, VALID);
        let client = client(&stub);
        let invoice = InvoiceFixtures::single_line();

        let receipt = client.submit_invoice(&invoice).await.unwrap();

        assert_eq!(receipt.document_number.as_deref(), Some("ERP-77"));
        assert_eq!(receipt.invoice_number, invoice.document_number());

        let call = &stub.calls_to(IMPORT_PATH)[0];
        assert_eq!(call.request.query_value(TOKEN_PARAM), Some("tok"));
        assert_eq!(call.request.content_type, Some("application/xml"));
        assert_eq!(call.request.body.as_deref(), Some(codec::encode(&invoice).unwrap().as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gateway_errors_retried_with_backoff() {
        let stub = Arc::new(ScriptedTransport::new());
        stub.respond(IMPORT_PATH, 503, "")
            .respond(IMPORT_PATH, 503, "")
            .respond(IMPORT_PATH, 200, VALID);
        let client = client(&stub);

        let receipt = client.submit_invoice(&InvoiceFixtures::single_line()).await.unwrap();
        assert_eq!(receipt.document_number.as_deref(), Some("ERP-77"));

        let calls = stub.calls_to(IMPORT_PATH);
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].at - calls[0].at, Duration::from_secs(1));
        assert_eq!(calls[2].at - calls[1].at, Duration::from_secs(2));
        assert_eq!(stub.count(AUTH_PATH), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_erp_rejection_is_validation_error() {
        let stub = Arc::new(ScriptedTransport::new());
        stub.respond(
            IMPORT_PATH,
            200,
            "<r><valid>false</valid><error>Supplier not found</error></r>",
        );
        let client = client(&stub);

        let err = client.submit_invoice(&InvoiceFixtures::single_line()).await.unwrap_err();
        assert_eq!(err, ErpError::Validation("Supplier not found".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_response_is_http_error() {
        let stub = Arc::new(ScriptedTransport::new());
        stub.respond(IMPORT_PATH, 200, "<html><body>oops");
        let client = client(&stub);

        let err = client.submit_invoice(&InvoiceFixtures::single_line()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Http);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_triggers_one_extra_token_request() {
        let stub = Arc::new(ScriptedTransport::new());
        stub.respond(IMPORT_PATH, 401, "").respond(IMPORT_PATH, 200, VALID);
        let client = client(&stub);

        client.submit_invoice(&InvoiceFixtures::single_line()).await.unwrap();
        assert_eq!(stub.count(AUTH_PATH), 2);
        assert_eq!(stub.count(IMPORT_PATH), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_called_once_per_submission() {
        let stub = Arc::new(ScriptedTransport::new());
        stub.respond(IMPORT_PATH, 200, VALID)
            .always(IMPORT_PATH, Reply::Respond(ErpResponse::new(503, "")));
        let recorder = Arc::new(Recorder::default());
        let stats = Arc::new(SubmissionStats::new());
        let client = client(&stub).with_observer(recorder.clone());
        let counted = ErpClient::from_parts(stub.clone(), client.token_provider(), RetryPolicy::new(0, 2.0))
            .with_observer(stats.clone());

        client.submit_invoice(&InvoiceFixtures::single_line()).await.unwrap();
        client.submit_invoice(&InvoiceFixtures::single_line()).await.unwrap_err();
        counted.submit_invoice(&InvoiceFixtures::single_line()).await.unwrap_err();

        let outcomes = recorder.outcomes.lock().unwrap().clone();
        assert_eq!(
            outcomes,
            vec![(true, None), (false, Some(ErrorKind::RetryExhausted))]
        );
        assert_eq!(stats.total(), 1);
        assert_eq!(stats.exhausted(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_closed_client_failure() {
        let stub = Arc::new(ScriptedTransport::new());
        let recorder = Arc::new(Recorder::default());
        let client = client(&stub).with_observer(recorder.clone());
        client.close().await;

        client.submit_invoice(&InvoiceFixtures::single_line()).await.unwrap_err();
        assert_eq!(recorder.outcomes.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_suppliers_json() {
        let stub = Arc::new(ScriptedTransport::new());
        stub.respond(SUPPLIERS_PATH, 200, r#"[{"id":"S1","name":"Acme"}]"#);
        let client = client(&stub);

        let suppliers = client.get_suppliers().await.unwrap();
        assert_eq!(suppliers, vec![SupplierRecord::new("S1", "Acme")]);
        assert_eq!(
            stub.calls_to(SUPPLIERS_PATH)[0].request.query_value(TOKEN_PARAM),
            Some("tok")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_suppliers_error_status() {
        let stub = Arc::new(ScriptedTransport::new());
        stub.respond(SUPPLIERS_PATH, 403, "Forbidden");
        let client = client(&stub);

        let err = client.get_suppliers().await.unwrap_err();
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_is_idempotent() {
        let stub = Arc::new(ScriptedTransport::new());
        let client = client(&stub);

        client.close().await;
        client.close().await;

        assert!(client.is_closed());
        assert!(stub.is_closed());
        let err = client.get_suppliers().await.unwrap_err();
        assert_eq!(err, ErpError::Network(TransportError::Closed));
        assert_eq!(stub.count(AUTH_PATH), 0);
    }

    #[test]
    fn test_negative_backoff_rejected_over_any_transport() {
        let stub = Arc::new(ScriptedTransport::new());
        let mut config = ErpClientConfig::new("https://erp.test", "admin").with_password("secret");
        config.backoff_factor = -1.0;

        let err = ErpClient::with_transport(&config, stub).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("backoff factor"));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let stub = Arc::new(ScriptedTransport::new());
        let config = ErpClientConfig::new("https://erp.test", "admin");
        let err = ErpClient::with_transport(&config, stub).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
