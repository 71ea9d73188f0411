use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct CredentialError(pub String);

/// Produces a renderable QR credential image for a (token, registration)
/// pair and returns its public URL. Implementations must tolerate retries:
/// the lifecycle calls this before committing a confirmation and will call
/// again if that commit has to be retried.
pub trait CredentialImages: Send + Sync {
    fn render(
        &self,
        token: &str,
        registration_id: &str,
    ) -> impl Future<Output = Result<String, CredentialError>> + Send;
}

fn qr_service_base_url() -> String {
    std::env::var("QR_SERVICE_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:54321/functions/v1".to_string())
}

/// Client for the QR edge function. The upstream upserts the image by
/// registration id, which is what makes retried confirmations safe.
#[derive(Clone)]
pub struct QrUpstream {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct QrResponse {
    #[serde(rename = "publicUrl")]
    public_url: String,
}

impl QrUpstream {
    pub fn from_env() -> Self {
        Self {
            base_url: qr_service_base_url(),
            client: reqwest::Client::new(),
        }
    }
}

impl CredentialImages for QrUpstream {
    async fn render(&self, token: &str, registration_id: &str) -> Result<String, CredentialError> {
        let url = format!("{}/generate-qr", self.base_url.trim_end_matches('/'));

        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "token": token,
                "registrationId": registration_id,
            }))
            .send()
            .await
            .map_err(|e| CredentialError(format!("connect to {} failed: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CredentialError(format!(
                "qr service returned {} for registration {}",
                status, registration_id
            )));
        }

        let body: QrResponse = resp
            .json()
            .await
            .map_err(|e| CredentialError(format!("qr service response unreadable: {}", e)))?;
        Ok(body.public_url)
    }
}
