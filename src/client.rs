//! Calling side of the lookup service.
//!
//! Opens the same mutually authenticated channel the server expects and
//! attaches the bearer credential to every outgoing call.

use std::fmt;

use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::interceptor::InterceptedService;
use tonic::service::Interceptor;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
use tracing::{debug, info};

use crate::auth::{AUTHORIZATION, BEARER_PREFIX};
use crate::config::ClientConfig;
use crate::error::{error_chain, LookupError};
use crate::mtls::TlsMaterial;
use crate::proto::search::v1::search_service_client::SearchServiceClient;
use crate::proto::search::v1::PhoneNumber;

/// Outcome for one number of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCode {
    /// The first code of the longest matching prefix
    Found(String),
    /// No registered prefix matches
    NotFound,
}

impl ResolvedCode {
    /// An empty code on the wire marks a number without a match.
    fn from_wire(code: String) -> Self {
        if code.is_empty() {
            Self::NotFound
        } else {
            Self::Found(code)
        }
    }

    /// The code, if one was found.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Found(code) => Some(code),
            Self::NotFound => None,
        }
    }
}

impl fmt::Display for ResolvedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(code) => f.write_str(code),
            Self::NotFound => f.write_str("NOT_FOUND"),
        }
    }
}

/// Adds `authorization: Bearer <token>` to each request.
#[derive(Clone)]
pub struct BearerCredential {
    value: MetadataValue<Ascii>,
}

impl BearerCredential {
    /// Prepares the header value for `token`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::TransportSetup`] if the token is not valid
    /// header text.
    pub fn new(token: &str) -> Result<Self, LookupError> {
        let value = format!("{BEARER_PREFIX}{token}")
            .parse()
            .map_err(|_| LookupError::transport_setup("auth token is not valid metadata"))?;
        Ok(Self { value })
    }
}

impl Interceptor for BearerCredential {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        request
            .metadata_mut()
            .insert(AUTHORIZATION, self.value.clone());
        Ok(request)
    }
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerCredential").finish_non_exhaustive()
    }
}

/// Client for `search.v1.SearchService`.
#[derive(Clone)]
pub struct SearchClient {
    inner: SearchServiceClient<InterceptedService<Channel, BearerCredential>>,
}

impl SearchClient {
    /// Loads the caller's TLS material and connects as configured.
    pub async fn connect(config: &ClientConfig) -> Result<Self, LookupError> {
        let tls = TlsMaterial::load(&config.tls)?;
        Self::connect_with(config.endpoint(), &tls, &config.tls_domain, &config.auth_token).await
    }

    /// Connects to `endpoint` (`https://host:port`), verifying the server
    /// certificate for `domain`.
    ///
    /// # Errors
    ///
    /// - [`LookupError::TransportSetup`] if the endpoint or TLS settings are
    ///   unusable
    /// - [`LookupError::Transport`] if the connection or handshake fails
    pub async fn connect_with(
        endpoint: impl Into<String>,
        tls: &TlsMaterial,
        domain: &str,
        token: &str,
    ) -> Result<Self, LookupError> {
        let endpoint = endpoint.into();
        let credential = BearerCredential::new(token)?;

        let channel = Endpoint::from_shared(endpoint.clone())
            .map_err(|e| LookupError::transport_setup(format!("invalid endpoint {endpoint}: {e}")))?
            .tls_config(tls.client_tls_config(domain))
            .map_err(|e| {
                LookupError::transport_setup(format!("invalid TLS configuration: {}", error_chain(&e)))
            })?
            .connect()
            .await?;

        info!(%endpoint, %domain, "Connected to lookup service");
        Ok(Self {
            inner: SearchServiceClient::with_interceptor(channel, credential),
        })
    }

    /// Resolves one number.
    ///
    /// # Errors
    ///
    /// [`LookupError::NotFound`] when no prefix matches; authentication and
    /// transport failures map to their own variants.
    pub async fn get_code_by_number(&mut self, number: &str) -> Result<String, LookupError> {
        let response = self
            .inner
            .get_code_by_number(PhoneNumber {
                phone_number: number.to_string(),
            })
            .await?;
        Ok(response.into_inner().mccmnc_code)
    }

    /// Resolves a batch over one streaming call.
    ///
    /// All numbers are sent and the request side closed before responses
    /// are drained. The result is aligned with `numbers`.
    pub async fn streaming_get_code_by_number(
        &mut self,
        numbers: &[String],
    ) -> Result<Vec<ResolvedCode>, LookupError> {
        let requests: Vec<PhoneNumber> = numbers
            .iter()
            .map(|number| PhoneNumber {
                phone_number: number.clone(),
            })
            .collect();

        let response = self
            .inner
            .streaming_get_code_by_number(futures::stream::iter(requests))
            .await?;
        let mut inbound = response.into_inner();

        let mut resolved = Vec::with_capacity(numbers.len());
        while let Some(code) = inbound.message().await? {
            resolved.push(ResolvedCode::from_wire(code.mccmnc_code));
        }
        debug!(sent = numbers.len(), received = resolved.len(), "Stream drained");

        if resolved.len() != numbers.len() {
            return Err(LookupError::Protocol {
                reason: format!(
                    "sent {} numbers but received {} codes",
                    numbers.len(),
                    resolved.len()
                ),
            });
        }
        Ok(resolved)
    }
}
