use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::time::Duration;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// How long a client success or error notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(2);

/// Where the client expects the API when no base URL is given.
pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
