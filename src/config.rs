use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Connection string of the target MongoDB deployment.
pub const MONGO_URI: &str = "MONGO_URI";
/// Email of the user created by `add-user`.
pub const DEFAULT_USER: &str = "DEFAULT_USER";
/// Logical database every collection lives in.
pub const DATABASE_NAME: &str = "rep2recall";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnvVar { name: &'static str },

    #[error("environment variable {name} is set but empty")]
    EmptyEnvVar { name: &'static str },

    /// The `.env` file exists but could not be read or parsed.
    #[error("failed to load env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },
}

/// What happened when looking for a `.env` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFile {
    Loaded(PathBuf),
    NotFound,
}

/// `.env` at the project root.
pub fn default_env_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(".env")
}

/// Load the project `.env`, falling back to the usual search upwards from
/// the working directory. Variables already set in the process win.
pub fn load_env_file() -> Result<EnvFile, ConfigError> {
    load_env_file_with(&default_env_path(), dotenv::dotenv)
}

/// Load `primary`, or run `fallback` when it does not exist.
pub fn load_env_file_with<F>(primary: &Path, fallback: F) -> Result<EnvFile, ConfigError>
where
    F: FnOnce() -> dotenv::Result<PathBuf>,
{
    match load_env_file_from(primary)? {
        EnvFile::Loaded(path) => Ok(EnvFile::Loaded(path)),
        EnvFile::NotFound => match fallback() {
            Ok(path) => Ok(EnvFile::Loaded(path)),
            Err(err) if is_not_found(&err) => Ok(EnvFile::NotFound),
            Err(source) => Err(ConfigError::EnvFile {
                path: PathBuf::from(".env"),
                source,
            }),
        },
    }
}

/// Load exactly `path`. A missing file is not an error.
pub fn load_env_file_from(path: &Path) -> Result<EnvFile, ConfigError> {
    match dotenv::from_path(path) {
        Ok(()) => Ok(EnvFile::Loaded(path.to_path_buf())),
        Err(err) if is_not_found(&err) => Ok(EnvFile::NotFound),
        Err(source) => Err(ConfigError::EnvFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn is_not_found(err: &dotenv::Error) -> bool {
    matches!(err, dotenv::Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound)
}

/// Read a variable that must be present and non-blank.
pub fn required<F>(lookup: F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or(ConfigError::MissingEnvVar { name })?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::EmptyEnvVar { name });
    }
    Ok(value.to_string())
}

/// Email for the default user seed, taken from `DEFAULT_USER`.
pub fn default_user_from_env() -> Result<String, ConfigError> {
    required(process_env, DEFAULT_USER)
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Connection settings shared by every tool in this crate.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub mongo_uri: String,
    pub database_name: String,
}

impl Config {
    pub fn new(mongo_uri: impl Into<String>) -> Self {
        Self {
            mongo_uri: mongo_uri.into(),
            database_name: DATABASE_NAME.to_string(),
        }
    }

    /// Build from the process environment. Call after [`load_env_file`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::new(required(lookup, MONGO_URI)?))
    }

    /// Connection string with the password masked, safe for logs.
    pub fn redacted_uri(&self) -> String {
        redact_uri(&self.mongo_uri)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("mongo_uri", &self.redacted_uri())
            .field("database_name", &self.database_name)
            .finish()
    }
}

fn redact_uri(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return uri.to_string();
    };
    let rest = &uri[scheme_end + 3..];
    // Userinfo ends at the last '@' before the path or query.
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let Some(at) = rest[..authority_end].rfind('@') else {
        return uri.to_string();
    };
    let userinfo = &rest[..at];
    let user = userinfo.split(':').next().unwrap_or_default();
    let masked = if userinfo.contains(':') {
        format!("{user}:***")
    } else {
        user.to_string()
    };
    format!("{}{}{}", &uri[..scheme_end + 3], masked, &rest[at..])
}
