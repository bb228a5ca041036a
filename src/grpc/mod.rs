//! gRPC Service Implementation
//!
//! Dispatches unary and bidirectional-streaming lookups to a [`Resolve`]
//! implementation. Credential checks happen before these handlers run, in
//! the [`AuthGate`](crate::auth::AuthGate) interceptor.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::LookupError;
use crate::observability::LookupMetrics;
use crate::proto::search::v1::search_service_server::SearchService;
use crate::proto::search::v1::{Code, PhoneNumber};
use crate::resolver::Resolve;

/// Response stream of `StreamingGetCodeByNumber`.
pub type CodeStream = Pin<Box<dyn Stream<Item = Result<Code, Status>> + Send + 'static>>;

/// Lookup service backed by a resolver.
pub struct SearchServiceImpl<R> {
    resolver: Arc<R>,
    metrics: Option<LookupMetrics>,
}

impl<R: Resolve> SearchServiceImpl<R> {
    /// Creates the service around `resolver`.
    pub fn new(resolver: R) -> Self {
        Self::from_arc(Arc::new(resolver))
    }

    /// Creates the service around an already shared resolver.
    pub fn from_arc(resolver: Arc<R>) -> Self {
        Self {
            resolver,
            metrics: None,
        }
    }

    /// Records lookup outcomes into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: LookupMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Generates a new correlation ID for request tracing.
    fn generate_correlation_id() -> Uuid {
        Uuid::new_v4()
    }
}

/// Resolves one number, recording the outcome.
fn resolve_one<R: Resolve>(
    resolver: &R,
    metrics: Option<&LookupMetrics>,
    method: &str,
    number: &str,
) -> Result<String, LookupError> {
    let result = resolver.resolve(number);
    if let Some(metrics) = metrics {
        metrics.record_lookup(method, result.is_ok());
    }
    if let Err(err) = &result {
        debug!(number = %number, error_code = err.code().as_str(), "No code for number");
    }
    result
}

#[tonic::async_trait]
impl<R: Resolve> SearchService for SearchServiceImpl<R> {
    #[instrument(
        skip(self, request),
        fields(correlation_id = %Self::generate_correlation_id())
    )]
    async fn get_code_by_number(
        &self,
        request: Request<PhoneNumber>,
    ) -> Result<Response<Code>, Status> {
        let number = request.into_inner().phone_number;
        let code = resolve_one(&*self.resolver, self.metrics.as_ref(), "unary", &number)?;
        Ok(Response::new(Code { mccmnc_code: code }))
    }

    type StreamingGetCodeByNumberStream = CodeStream;

    #[instrument(
        skip(self, request),
        fields(correlation_id = %Self::generate_correlation_id())
    )]
    async fn streaming_get_code_by_number(
        &self,
        request: Request<Streaming<PhoneNumber>>,
    ) -> Result<Response<Self::StreamingGetCodeByNumberStream>, Status> {
        let inbound = request.into_inner();
        let resolver = Arc::clone(&self.resolver);
        let metrics = self.metrics.clone();
        let guard = metrics.as_ref().map(LookupMetrics::stream_opened);
        info!("Streaming lookup opened");

        // Lazily mapped: the next request is read only once the previous
        // response has been pulled by the transport. Dropping the response
        // stream drops the inbound stream with it.
        let outbound = inbound.map(move |message| {
            let _open = &guard;
            let number = message?.phone_number;
            let mccmnc_code =
                match resolve_one(&*resolver, metrics.as_ref(), "streaming", &number) {
                    Ok(code) => code,
                    Err(err) if err.is_not_found() => String::new(),
                    Err(err) => return Err(err.to_status()),
                };
            Ok(Code { mccmnc_code })
        });

        Ok(Response::new(Box::pin(outbound)))
    }
}
