// rpc/src/transport.rs
use crate::{RpcError, RpcRequest, RpcResponse, RpcResult};
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, Uri};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Connection settings for the observed node
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub host: String,
    pub port: u16,
    /// Expected chain id, checked by `ChainClient::verify_chain_id`
    pub chain_id: Option<u64>,
    /// Upper bound for a single request/response exchange
    pub request_timeout: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8545,
            chain_id: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RpcConfig {
    /// HTTP endpoint the requests are posted to
    pub fn endpoint(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.contains("://") {
            format!("{}:{}/", host, self.port)
        } else {
            format!("http://{}:{}/", host, self.port)
        }
    }
}

/// JSON-RPC over HTTP POST
pub struct HttpTransport {
    client: Client<HttpConnector, Body>,
    endpoint: Uri,
    timeout: Duration,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(config: &RpcConfig) -> RpcResult<Self> {
        let endpoint = config.endpoint();
        let uri = endpoint
            .parse::<Uri>()
            .map_err(|e| RpcError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

        // the connector speaks plain http only
        if uri.scheme_str() != Some("http") {
            return Err(RpcError::InvalidEndpoint(format!(
                "{}: only http endpoints are supported",
                endpoint
            )));
        }

        Ok(Self {
            client: Client::new(),
            endpoint: uri,
            timeout: config.request_timeout,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// Frame a method call; ids increase per transport
    pub fn build_request(&self, method: &str, params: Vec<serde_json::Value>) -> RpcRequest {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        RpcRequest::new(id, method, params)
    }

    /// Perform the exchange and normalize the failure modes
    pub async fn send(&self, request: &RpcRequest) -> RpcResult<RpcResponse> {
        tracing::trace!(method = %request.method, id = request.id, "Sending RPC request");

        let body = serde_json::to_vec(request)
            .map_err(|e| RpcError::Protocol(format!("cannot encode request: {}", e)))?;

        let bytes = tokio::time::timeout(self.timeout, self.exchange(body))
            .await
            .map_err(|_| RpcError::Timeout(self.timeout))??;

        let response = decode_response(&request.method, &bytes);
        if let Err(e) = &response {
            tracing::debug!(method = %request.method, id = request.id, "RPC request failed: {}", e);
        }
        response
    }

    /// Build, send and return the bare result value
    pub async fn call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> RpcResult<serde_json::Value> {
        let request = self.build_request(method, params);
        let response = self.send(&request).await?;
        response
            .result
            .ok_or_else(|| RpcError::EmptyResult(method.to_string()))
    }

    async fn exchange(&self, body: Vec<u8>) -> RpcResult<hyper::body::Bytes> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            tracing::debug!("Node answered with HTTP status {}", response.status());
        }

        hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))
    }
}

/// Decode a response body into an envelope.
///
/// A non-empty error message wins over a populated result; a response with
/// neither is reported as empty.
pub fn decode_response(method: &str, body: &[u8]) -> RpcResult<RpcResponse> {
    let response: RpcResponse = serde_json::from_slice(body)
        .map_err(|e| RpcError::Protocol(format!("{}: {}", method, e)))?;

    if let Some(error) = &response.error {
        if !error.message.is_empty() {
            return Err(RpcError::Remote {
                code: error.code,
                message: error.message.clone(),
            });
        }
    }

    if response.result.is_none() {
        return Err(RpcError::EmptyResult(method.to_string()));
    }

    Ok(response)
}
