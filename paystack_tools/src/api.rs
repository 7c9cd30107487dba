use std::sync::Arc;

use coffee_common::Money;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::PaystackConfig,
    data_objects::{InitializeTransactionRequest, InitializeTransactionResponse, PaystackTransaction},
    helpers::to_subunit,
    PaystackApiError,
};

#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for PaystackApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaystackApi").field("base_url", &self.config.base_url).finish()
    }
}

impl PaystackApi {
    /// Creates a client. Fails with [`PaystackApiError::NotConfigured`] if the secret key or base URL is missing.
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        if !config.is_configured() {
            return Err(PaystackApiError::NotConfigured);
        }
        let mut headers = HeaderMap::with_capacity(2);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.secret.reveal()))
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PaystackApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| PaystackApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| PaystackApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| PaystackApiError::RestResponseError(e.to_string()))?;
            Err(PaystackApiError::QueryError { status, message })
        }
    }

    /// Opens a checkout session for `amount` (in Naira). The customer completes payment at the returned
    /// `authorization_url`.
    pub async fn initialize_transaction(
        &self,
        email: &str,
        amount: Money,
        reference: &str,
    ) -> Result<PaystackTransaction, PaystackApiError> {
        let body = InitializeTransactionRequest {
            amount: to_subunit(amount)?.to_string(),
            email: email.to_string(),
            reference: reference.to_string(),
        };
        debug!("💳️ Initializing Paystack transaction {reference} for {amount}");
        let response = self
            .rest_query::<InitializeTransactionResponse, _>(Method::POST, "/transaction/initialize", Some(body))
            .await?;
        if !response.status {
            warn!("💳️ Paystack rejected transaction {reference}: {}", response.message);
            return Err(PaystackApiError::Rejected(response.message));
        }
        let tx = response
            .data
            .ok_or_else(|| PaystackApiError::JsonError("Response did not contain transaction data".into()))?;
        info!("💳️ Paystack transaction {} initialized", tx.reference);
        Ok(tx)
    }
}
