pub mod config;
pub mod database;
pub mod models;
pub mod seeds;

use config::{ConfigError, EnvFile};

/// Load `.env` and start the logger. Every binary calls this first.
pub fn prepare_environment() {
    // The env file goes first so RUST_LOG can come from it.
    let env_file = config::load_env_file();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let (level, message) = env_file_diagnostic(&env_file);
    log::log!(level, "{}", message);
}

/// Log line for the `.env` lookup. Every outcome is visible at the default
/// `info` filter.
fn env_file_diagnostic(env_file: &Result<EnvFile, ConfigError>) -> (log::Level, String) {
    match env_file {
        Ok(EnvFile::Loaded(path)) => (
            log::Level::Info,
            format!("📄 Loaded environment from {}", path.display()),
        ),
        Ok(EnvFile::NotFound) => (
            log::Level::Warn,
            "⚠️  No .env file found, using process environment".to_string(),
        ),
        Err(e) => (log::Level::Warn, format!("⚠️  {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_env_file_diagnostic_levels() {
        let (level, message) = env_file_diagnostic(&Ok(EnvFile::Loaded(PathBuf::from("/app/.env"))));
        assert_eq!(level, log::Level::Info);
        assert!(message.contains("/app/.env"));

        let (level, message) = env_file_diagnostic(&Ok(EnvFile::NotFound));
        assert_eq!(level, log::Level::Warn);
        assert!(message.contains("No .env file found"));
        assert!(level <= log::LevelFilter::Info);

        let err = ConfigError::EnvFile {
            path: PathBuf::from(".env"),
            source: dotenv::Error::LineParse("BROKEN".to_string(), 0),
        };
        let (level, message) = env_file_diagnostic(&Err(err));
        assert_eq!(level, log::Level::Warn);
        assert!(message.contains("failed to load env file .env"));
    }
}
