#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Hard cap on placements accepted per offer, regardless of how many a
    /// matcher proposes.
    ///
    /// Purpose:
    /// - bound how much work a single offer round can hand to the executor
    /// - keep a misbehaving matcher from monopolizing an offer
    pub max_tasks_per_offer: usize,

    /// Starting balance for the launch-rate token bucket.
    ///
    /// Purpose:
    /// - caps how many task launches can be accepted before the control
    ///   plane has to top the bucket back up
    pub initial_launch_tokens: u64,

    /// How long an offer is held open for matching before the Manager
    /// finishes it with whatever placements it has accumulated.
    pub offer_deadline_ms: u64,

    /// Maximum number of concurrent control-plane calls the admission
    /// filter lets through at once.
    ///
    /// Purpose:
    /// - bound downstream load from retried/bursty callers
    pub concurrent_requests: usize,

    /// How long a caller waits for an admission permit before being
    /// rejected with a 503-equivalent.
    pub admission_wait_ms: u64,

    /// Emit JSON-formatted logs instead of the human-readable default.
    pub log_json: bool,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            max_tasks_per_offer: parse_env("MAX_TASKS_PER_OFFER", 16),
            initial_launch_tokens: parse_env("INITIAL_LAUNCH_TOKENS", 64),
            offer_deadline_ms: parse_env("OFFER_DEADLINE_MS", 250),
            concurrent_requests: parse_env("CONCURRENT_REQUESTS", 32),
            admission_wait_ms: parse_env("ADMISSION_WAIT_MS", 50),
            log_json: std::env::var("LOG_JSON").map(|v| v == "1").unwrap_or(false),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
