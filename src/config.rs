// ⚙️ Configuration & logging bootstrap

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_DATABASE_PATH: &str = "finances.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings for the HTTP server, from flags or environment
#[derive(Debug, Clone, Parser)]
#[command(name = "finances-server", version, about = "Bank statement upload API")]
pub struct ServerConfig {
    /// SQLite database file
    #[arg(long = "db", env = "FINANCES_DATABASE_PATH", default_value = DEFAULT_DATABASE_PATH)]
    pub database_path: PathBuf,

    /// Address to listen on
    #[arg(long = "bind", env = "FINANCES_BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    pub bind_addr: SocketAddr,

    /// trace, debug, info, warn or error (or a full filter directive)
    #[arg(long, env = "FINANCES_LOG", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

/// Turn a user-supplied level into an `EnvFilter` directive.
///
/// Common level spellings are normalised; anything that is neither a level
/// nor a `target=level` directive becomes `info`.
pub fn filter_directive(log_level: &str) -> String {
    let trimmed = log_level.trim();
    match trimmed.to_uppercase().as_str() {
        "TRACE" => "trace".to_string(),
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARN" | "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        "OFF" => "off".to_string(),
        _ if trimmed.contains('=') => trimmed.to_string(),
        _ => DEFAULT_LOG_LEVEL.to_string(),
    }
}

/// Install the global tracing subscriber. Fails if one is already set.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let subscriber = fmt::layer().with_target(false).with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};
    use std::ffi::OsString;

    /// Parse flags with the `FINANCES_*` fallbacks detached from every argument
    fn parse_ignoring_env(args: &[&str]) -> ServerConfig {
        let mut command = ServerConfig::command();
        for id in ["database_path", "bind_addr", "log_level"] {
            command = command.mut_arg(id, |arg| arg.env(None::<&'static str>));
        }
        let matches = command.try_get_matches_from(args.iter().copied()).unwrap();
        ServerConfig::from_arg_matches(&matches).unwrap()
    }

    #[test]
    fn test_filter_directive_levels() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("warning"), "warn");
        assert_eq!(filter_directive(" Info "), "info");
        assert_eq!(filter_directive("critical"), "error");
    }

    #[test]
    fn test_filter_directive_passes_targets_through() {
        assert_eq!(
            filter_directive("statement_ingest=debug,tower_http=info"),
            "statement_ingest=debug,tower_http=info"
        );
    }

    #[test]
    fn test_filter_directive_unknown_falls_back_to_info() {
        assert_eq!(filter_directive("verbose"), "info");
        assert_eq!(filter_directive(""), "info");
    }

    #[test]
    fn test_server_config_defaults() {
        let config = parse_ignoring_env(&["finances-server"]);
        assert_eq!(config.database_path, PathBuf::from("finances.db"));
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_server_config_flags() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("test.db");

        let args: Vec<OsString> = vec![
            "finances-server".into(),
            "--db".into(),
            db.clone().into_os_string(),
            "--bind".into(),
            "127.0.0.1:8080".into(),
        ];
        let config = ServerConfig::try_parse_from(args).unwrap();
        assert_eq!(config.database_path, db);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_server_config_rejects_bad_address() {
        assert!(ServerConfig::try_parse_from(["finances-server", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn test_server_config_flags_without_env() {
        let config = parse_ignoring_env(&["finances-server", "--log-level", "debug"]);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
    }
}
