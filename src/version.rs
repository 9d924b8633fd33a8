// Version information for the Embedding API Node

/// Semantic version number
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Endpoints served by this build
pub const ENDPOINTS: &[&str] = &["/", "/health", "/embed", "/query-to-embedding"];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Embedding API Node {}", VERSION)
}
