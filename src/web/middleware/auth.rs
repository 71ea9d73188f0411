use axum::{extract::Request, http::header, middleware::Next, response::Response};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

/// The acting profile, as asserted by the identity provider. Sign-in itself
/// is external; this middleware only reads the session it left behind.
#[derive(Clone, Debug)]
pub struct AuthenticatedProfile {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct JwtPayload {
    sub: String,
    email: Option<String>,
}

pub async fn require_auth(mut request: Request, next: Next) -> Response {
    // Extract the access token from the request cookies
    let token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split("; ")
                .find(|c| c.starts_with("access_token="))
                .and_then(|c| c.strip_prefix("access_token="))
        });

    if let Some(token) = token {
        // Parse JWT payload (middle part)
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() == 3 {
            if let Ok(payload_bytes) = general_purpose::URL_SAFE_NO_PAD.decode(parts[1]) {
                if let Ok(payload) = serde_json::from_slice::<JwtPayload>(&payload_bytes) {
                    request.extensions_mut().insert(AuthenticatedProfile {
                        id: payload.sub,
                        email: payload.email,
                    });

                    return next.run(request).await;
                }
            }
        }
    }

    // No valid token or parse error, return 401
    Response::builder()
        .status(401)
        .body(axum::body::Body::from("Unauthorized - Please login"))
        .unwrap()
}
