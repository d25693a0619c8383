//! Canonical metric names shared by the instrumentation writers and the
//! analytics readers. Keeping them in one place means a rename cannot split
//! the two sides silently.

// HTTP request instrumentation
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const HTTP_REQUEST_SIZE_BYTES: &str = "http_request_size_bytes";
pub const HTTP_RESPONSE_SIZE_BYTES: &str = "http_response_size_bytes";
pub const HTTP_REQUESTS_ACTIVE: &str = "http_requests_active";
pub const HTTP_REQUEST_ERRORS_TOTAL: &str = "http_request_errors_total";
pub const HTTP_SLOW_REQUESTS_TOTAL: &str = "http_slow_requests_total";

// process / runtime sampling
pub const APP_CPU_SECONDS_TOTAL: &str = "app_cpu_seconds_total";
pub const APP_CPU_USAGE_PERCENT: &str = "app_cpu_usage_percent";
pub const APP_MEMORY_RESIDENT_BYTES: &str = "app_memory_resident_bytes";
pub const APP_MEMORY_VIRTUAL_BYTES: &str = "app_memory_virtual_bytes";
pub const APP_MEMORY_USAGE_PERCENT: &str = "app_memory_usage_percent";
pub const APP_THREADS_TOTAL: &str = "app_threads_total";
pub const APP_OPEN_FDS: &str = "app_open_fds";
pub const APP_START_TIME_SECONDS: &str = "app_start_time_seconds";
pub const APP_UPTIME_SECONDS: &str = "app_uptime_seconds";
pub const APP_RUNTIME_WORKERS: &str = "app_runtime_workers";
pub const APP_RUNTIME_ALIVE_TASKS: &str = "app_runtime_alive_tasks";
pub const APP_INFO: &str = "app_info";

// analytics metric keys (alert rules, trend entries)
pub const KEY_CPU_PERCENT: &str = "cpu_percent";
pub const KEY_MEMORY_PERCENT: &str = "memory_percent";
pub const KEY_ERROR_RATE_PERCENT: &str = "error_rate_percent";
pub const KEY_P95_LATENCY_SECONDS: &str = "p95_latency_seconds";
pub const KEY_ACTIVE_REQUESTS: &str = "active_requests";
pub const KEY_REQUEST_RATE: &str = "request_rate";
