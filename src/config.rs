use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Harmonic Analysis Toolkit API")]
pub struct Args {
    /// Host to bind to (overrides HARMONIC_TOOLKIT_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides HARMONIC_TOOLKIT_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where report payloads are stored (overrides HARMONIC_TOOLKIT_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides HARMONIC_TOOLKIT_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let cfg = Self::resolve(&args)?;
        Ok((cfg, args.migrate))
    }

    /// Merge CLI overrides onto environment fallbacks.
    fn resolve(args: &Args) -> Result<Self> {
        let env_host = env::var("HARMONIC_TOOLKIT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("HARMONIC_TOOLKIT_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing HARMONIC_TOOLKIT_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8501,
            Err(err) => return Err(err).context("reading HARMONIC_TOOLKIT_PORT"),
        };
        let env_storage =
            env::var("HARMONIC_TOOLKIT_STORAGE_DIR").unwrap_or_else(|_| "./data/reports".into());
        let env_db = env::var("HARMONIC_TOOLKIT_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/harmonic_toolkit.db".into());

        Ok(Self {
            host: args.host.clone().unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.clone().unwrap_or(env_storage),
            database_url: args.database_url.clone().unwrap_or(env_db),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_args() -> Args {
        Args {
            host: None,
            port: None,
            storage_dir: None,
            database_url: None,
            migrate: false,
        }
    }

    #[test]
    fn cli_overrides_win() {
        let args = Args {
            host: Some("127.0.0.1".into()),
            port: Some(9000),
            storage_dir: Some("/tmp/reports".into()),
            database_url: Some("sqlite://./x.db".into()),
            migrate: false,
        };
        let cfg = AppConfig::resolve(&args).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.storage_dir, "/tmp/reports");
        assert_eq!(cfg.database_url, "sqlite://./x.db");
        assert_eq!(cfg.addr(), "127.0.0.1:9000");
    }

    #[test]
    fn defaults_apply_without_env_or_cli() {
        // env vars are absent in the test environment unless set explicitly
        if env::var("HARMONIC_TOOLKIT_PORT").is_ok()
            || env::var("HARMONIC_TOOLKIT_STORAGE_DIR").is_ok()
        {
            return;
        }
        let cfg = AppConfig::resolve(&bare_args()).unwrap();
        assert_eq!(cfg.port, 8501);
        assert_eq!(cfg.storage_dir, "./data/reports");
    }
}
