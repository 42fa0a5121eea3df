use axum::http::{header, HeaderName, HeaderValue, Method};
use std::env;
use tower_http::cors::CorsLayer;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origins())
        // The API only serves GET/POST/DELETE; OPTIONS covers preflight.
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-user-id"),
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(PREFLIGHT_MAX_AGE_SECS))
}

fn allowed_origins() -> Vec<HeaderValue> {
    let origins_str =
        env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string());

    let origins: Vec<HeaderValue> = parse_origins(&origins_str);

    if origins.is_empty() {
        // A wildcard cannot be combined with credentials, so fall back to
        // the development defaults instead.
        tracing::warn!("CORS: no valid origins configured, using development defaults");
        parse_origins(DEFAULT_ALLOWED_ORIGINS)
    } else {
        tracing::info!("CORS: configured with {} allowed origin(s)", origins.len());
        origins
    }
}

fn parse_origins(origins_str: &str) -> Vec<HeaderValue> {
    origins_str
        .split(',')
        .filter_map(|origin| {
            let trimmed = origin.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("CORS: invalid origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_cors_layer_does_not_panic() {
        let _layer = create_cors_layer();
    }

    #[test]
    fn default_origins_parse() {
        assert_eq!(parse_origins(DEFAULT_ALLOWED_ORIGINS).len(), 2);
    }

    #[test]
    fn garbage_origins_are_dropped() {
        let origins = parse_origins("http://ok.example, ,\u{7f}bad");
        assert_eq!(origins.len(), 1);
    }
}
