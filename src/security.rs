use crate::errors::AppError;
use axum::http::HeaderMap;
use governor::{
    clock::DefaultClock,
    state::{keyed::DefaultKeyedStateStore, InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;

pub fn require_bearer(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    let auth = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    let token = auth.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;
    if token != expected {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

pub fn check_origin(headers: &HeaderMap, allowed: &[String]) -> Result<(), AppError> {
    let origin = headers
        .get("Origin")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::OriginDenied)?;
    if allowed.iter().any(|o| o == origin) {
        Ok(())
    } else {
        Err(AppError::OriginDenied)
    }
}

pub fn content_length_ok(headers: &HeaderMap, max_kb: usize) -> Result<(), AppError> {
    if let Some(len) = headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
    {
        if len > max_kb * 1024 {
            return Err(AppError::RequestTooLarge);
        }
    }
    Ok(())
}

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;
type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

struct LimiterInner {
    global: DirectLimiter,
    per_token: KeyedLimiter,
}

/// Global plus per-bearer-token request quotas.
#[derive(Clone)]
pub struct RateLimiters {
    inner: Arc<LimiterInner>,
}

impl RateLimiters {
    pub fn new(global_rps: u32, global_burst: u32, token_rps: u32, token_burst: u32) -> Self {
        let global = Quota::per_second(at_least_one(global_rps)).allow_burst(at_least_one(global_burst));
        let per_token = Quota::per_second(at_least_one(token_rps)).allow_burst(at_least_one(token_burst));
        Self {
            inner: Arc::new(LimiterInner {
                global: RateLimiter::direct(global),
                per_token: RateLimiter::keyed(per_token),
            }),
        }
    }

    pub fn check(&self, token: Option<&str>) -> Result<(), AppError> {
        self.inner.global.check().map_err(|_| AppError::RateLimited)?;
        if let Some(t) = token {
            self.inner
                .per_token
                .check_key(&t.to_string())
                .map_err(|_| AppError::RateLimited)?;
        }
        Ok(())
    }
}

fn at_least_one(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap_or(nonzero!(1u32))
}
