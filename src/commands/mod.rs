/// Serve command functionality
pub mod serve;
/// Validate config command functionality
pub mod validate_config;
