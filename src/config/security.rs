use std::env;
use std::sync::OnceLock;

use axum::extract::Request;
use axum::http::header::{
    HeaderName, HeaderValue, CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
    X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::middleware::Next;
use axum::response::Response;

const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

const NOSNIFF: &str = "nosniff";
const DENY: &str = "DENY";
const XSS_BLOCK: &str = "1; mode=block";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";
const CSP_API_VALUE: &str = "default-src 'none'; frame-ancestors 'none'";
const REFERRER_POLICY_VALUE: &str = "strict-origin-when-cross-origin";
const PERMISSIONS_POLICY_VALUE: &str = "geolocation=(), microphone=(), camera=()";

static INCLUDE_HSTS: OnceLock<bool> = OnceLock::new();

/// HSTS only makes sense behind HTTPS, so it is tied to production mode.
fn include_hsts() -> bool {
    *INCLUDE_HSTS.get_or_init(|| {
        env::var("RUST_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false)
    })
}

/// Adds the standard security headers to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static(DENY));
    headers.insert(X_XSS_PROTECTION, HeaderValue::from_static(XSS_BLOCK));
    headers.insert(
        CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CSP_API_VALUE),
    );
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static(REFERRER_POLICY_VALUE),
    );
    headers.insert(
        PERMISSIONS_POLICY,
        HeaderValue::from_static(PERMISSIONS_POLICY_VALUE),
    );

    if include_hsts() {
        headers.insert(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsts_defaults_to_disabled() {
        std::env::remove_var("RUST_ENV");
        assert!(!include_hsts());
    }

    #[test]
    fn header_values_are_well_formed() {
        for value in [
            NOSNIFF,
            DENY,
            XSS_BLOCK,
            HSTS_VALUE,
            CSP_API_VALUE,
            REFERRER_POLICY_VALUE,
            PERMISSIONS_POLICY_VALUE,
        ] {
            assert!(value.parse::<HeaderValue>().is_ok());
        }
    }
}
