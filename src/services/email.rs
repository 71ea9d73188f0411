use serde::Serialize;
use tracing::{debug, warn};

/// Best-effort email dispatch. Registration and confirmation emails follow a
/// successful state transition; a delivery failure is logged and swallowed,
/// never rolled back into the operation that triggered it.
#[derive(Clone)]
pub struct Notifier {
    base_url: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct EmailPayload {
    #[serde(rename = "userEmail")]
    user_email: String,
    #[serde(rename = "userName")]
    user_name: String,
    #[serde(rename = "eventName")]
    event_name: String,
}

impl Notifier {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("EMAIL_SERVICE_URL").ok(),
            client: reqwest::Client::new(),
        }
    }

    pub fn registration_received(&self, email: Option<String>, name: String, event_name: String) {
        self.dispatch("registration-received", email, name, event_name);
    }

    pub fn payment_confirmed(&self, email: Option<String>, name: String, event_name: String) {
        self.dispatch("payment-confirmation", email, name, event_name);
    }

    fn dispatch(&self, kind: &'static str, email: Option<String>, name: String, event_name: String) {
        let Some(base) = self.base_url.clone() else {
            debug!(kind, "email dispatch disabled, skipping");
            return;
        };
        let Some(email) = email else {
            debug!(kind, "no email on file, skipping");
            return;
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            let url = format!("{}/{}", base.trim_end_matches('/'), kind);
            let payload = EmailPayload {
                user_email: email,
                user_name: name,
                event_name,
            };
            let result = client.post(&url).json(&payload).send().await;
            match result {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => warn!(kind, status = %resp.status(), "email dispatch rejected"),
                Err(e) => warn!(kind, error = %e, "email dispatch failed"),
            }
        });
    }
}
