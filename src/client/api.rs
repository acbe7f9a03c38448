/**
 * Remote Service Client
 *
 * The store server is an external collaborator. The sync engine and the
 * connectivity monitor only talk to it through the [`RemoteService`] trait,
 * so tests and alternative transports can stand in for the HTTP client.
 *
 * # Endpoints
 *
 * - `GET  {products_path}?skip=&limit=` - one page of the catalog
 * - `POST {sales_path}` - submit one sale
 * - `HEAD {health_path}` - lightweight reachability probe
 */
use crate::client::config::Config;
use crate::client::error::{RemoteError, RemoteResult};
use crate::shared::{CatalogPage, SaleSubmission};
use futures_util::future::BoxFuture;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// Default catalog listing path
pub const DEFAULT_PRODUCTS_PATH: &str = "/productos/";
/// Default sale submission path
pub const DEFAULT_SALES_PATH: &str = "/ventas/";

/// Calls the core makes against the store server
pub trait RemoteService: Send + Sync {
    /// Fetch one catalog page starting at `skip`
    fn fetch_catalog_page(&self, skip: u64, limit: u32) -> BoxFuture<'_, RemoteResult<CatalogPage>>;

    /// Submit one sale; `Ok` means the server accepted it
    fn submit_sale<'a>(&'a self, sale: &'a SaleSubmission) -> BoxFuture<'a, RemoteResult<()>>;

    /// Probe the health endpoint; `Ok` means the server is reachable
    fn health_check(&self) -> BoxFuture<'_, RemoteResult<()>>;
}

/// HTTP implementation of [`RemoteService`]
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    config: Config,
    products_path: String,
    sales_path: String,
    probe_timeout: Duration,
}

impl HttpRemote {
    /// Build a client with the configured request timeout
    pub fn new(config: &Config) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(config.app().request_timeout)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            products_path: DEFAULT_PRODUCTS_PATH.to_string(),
            sales_path: DEFAULT_SALES_PATH.to_string(),
            probe_timeout: config.app().probe_timeout,
        })
    }

    pub fn with_products_path(mut self, path: impl Into<String>) -> Self {
        self.products_path = path.into();
        self
    }

    pub fn with_sales_path(mut self, path: impl Into<String>) -> Self {
        self.sales_path = path.into();
        self
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.get_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn ensure_success(response: Response) -> RemoteResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl RemoteService for HttpRemote {
    fn fetch_catalog_page(&self, skip: u64, limit: u32) -> BoxFuture<'_, RemoteResult<CatalogPage>> {
        Box::pin(async move {
            let url = self.config.api_url(&self.products_path);
            let request = self
                .client
                .get(&url)
                .query(&[("skip", skip.to_string()), ("limit", limit.to_string())]);

            let response = self.authorize(request).send().await?;
            let response = Self::ensure_success(response).await?;

            response
                .json::<CatalogPage>()
                .await
                .map_err(|e| RemoteError::Decode(e.to_string()))
        })
    }

    fn submit_sale<'a>(&'a self, sale: &'a SaleSubmission) -> BoxFuture<'a, RemoteResult<()>> {
        Box::pin(async move {
            let url = self.config.api_url(&self.sales_path);
            let request = self.client.post(&url).json(sale);

            let response = self.authorize(request).send().await?;
            Self::ensure_success(response).await?;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'_, RemoteResult<()>> {
        Box::pin(async move {
            let url = self.config.api_url(&self.config.app().health_path);
            let response = self
                .client
                .head(&url)
                .timeout(self.probe_timeout)
                .send()
                .await?;
            Self::ensure_success(response).await?;
            Ok(())
        })
    }
}
