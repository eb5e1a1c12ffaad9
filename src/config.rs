use axum::http::Method;
use chrono::NaiveTime;
use clap::Parser;

pub const DEFAULT_MAX_REQUESTS: usize = 5;
pub const DEFAULT_WINDOW_SECONDS: u32 = 60;
pub const DEFAULT_PROTECTED_PATHS: [&str; 4] = [
    "/api/admin/",
    "/api/moderate/",
    "/api/users/delete/",
    "/api/conversations/delete/",
];

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-gateway")]
#[command(about = "Night-only chat service behind a time window and per-client rate gate")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    // Max mutating requests per client per window
    #[arg(long, default_value_t = DEFAULT_MAX_REQUESTS)]
    pub rate_limit: usize,

    // Rate limit window in seconds
    #[arg(long, default_value_t = DEFAULT_WINDOW_SECONDS)]
    pub rate_window: u32,

    // Methods counted by the rate gate (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "POST", value_parser = parse_method)]
    pub rate_methods: Vec<Method>,

    // Start of the allowed band, HH:MM
    #[arg(long, default_value = "21:00", value_parser = parse_time_of_day)]
    pub allowed_start: NaiveTime,

    // End of the allowed band (exclusive), HH:MM
    #[arg(long, default_value = "06:00", value_parser = parse_time_of_day)]
    pub allowed_end: NaiveTime,

    // Path prefixes that need an admin or moderator (comma-separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "/api/admin/,/api/moderate/,/api/users/delete/,/api/conversations/delete/"
    )]
    pub protected_paths: Vec<String>,

    // Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

fn parse_method(value: &str) -> Result<Method, String> {
    Method::from_bytes(value.trim().to_ascii_uppercase().as_bytes())
        .map_err(|e| format!("invalid method `{value}`: {e}"))
}

fn parse_time_of_day(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| format!("invalid time of day `{value}` (expected HH:MM): {e}"))
}

/// Immutable gate settings, built once at startup.
#[derive(Clone, Debug)]
pub struct GateConfig {
    pub max_requests: usize,
    pub window_seconds: u32,
    pub rate_methods: Vec<Method>,
    pub allowed_start: NaiveTime,
    pub allowed_end: NaiveTime,
    pub protected_paths: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window_seconds: DEFAULT_WINDOW_SECONDS,
            rate_methods: vec![Method::POST],
            allowed_start: NaiveTime::from_hms_opt(21, 0, 0).unwrap_or_default(),
            allowed_end: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default(),
            protected_paths: DEFAULT_PROTECTED_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl From<&Args> for GateConfig {
    fn from(args: &Args) -> Self {
        Self {
            max_requests: args.rate_limit,
            window_seconds: args.rate_window,
            rate_methods: args.rate_methods.clone(),
            allowed_start: args.allowed_start,
            allowed_end: args.allowed_end,
            protected_paths: args
                .protected_paths
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}
