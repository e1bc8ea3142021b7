use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use ulid::Ulid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Request-scoped id carried through extensions so error envelopes and logs
/// can tie back to one call. Minted here when the caller sends none.
#[derive(Clone, Debug)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    fn mint() -> Self {
        Self(format!("corr_{}", Ulid::new()))
    }
}

fn propagated_id<B>(request: &Request<B>) -> Option<CorrelationId> {
    let raw = request.headers().get(CORRELATION_HEADER)?.to_str().ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(CorrelationId(trimmed.to_string()))
}

pub async fn correlation_middleware(mut request: Request<Body>, next: Next) -> Response {
    let id = propagated_id(&request).unwrap_or_else(CorrelationId::mint);
    request.extensions_mut().insert(id.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id.0) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(CORRELATION_HEADER), value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_header_is_replaced_with_minted_id() {
        let request = Request::builder()
            .header(CORRELATION_HEADER, "   ")
            .body(())
            .expect("request");
        assert!(propagated_id(&request).is_none());
        assert!(CorrelationId::mint().0.starts_with("corr_"));
    }

    #[test]
    fn test_caller_supplied_id_is_propagated() {
        let request = Request::builder()
            .header(CORRELATION_HEADER, "corr_abc123")
            .body(())
            .expect("request");
        let id = propagated_id(&request).expect("propagated");
        assert_eq!(id.0, "corr_abc123");
    }
}
