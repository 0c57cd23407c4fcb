/// Configuration management commands
pub mod config_cmd;
/// DORA metrics report generation
pub mod report;
