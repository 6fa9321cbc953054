// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;

/// Default request body limit for uploaded collections.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `master.json` and the ranking tables.
    pub data_dir: PathBuf,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory containing pre-built frontend files to serve.
    /// When set, the backend serves static files from this path.
    pub static_dir: Option<PathBuf>,
    /// Request body limit for collection queries.
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `DATA_DIR` - Game master and rankings directory (default: `data`)
    /// - `PORT` - HTTP server port (default: 5000)
    /// - `STATIC_DIR` - Path to frontend dist directory for static file serving
    /// - `MAX_UPLOAD_BYTES` - Body limit for collection payloads (default: 64 MiB)
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    /// - `--data-dir <DIR>` - Override the data directory
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = Self::parse_cli_value(args, "--data-dir")
            .or_else(|| env("DATA_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(5000);

        let static_dir = env("STATIC_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let max_upload_bytes = env("MAX_UPLOAD_BYTES")
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Config {
            data_dir,
            port,
            static_dir,
            max_upload_bytes,
        }
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }

    pub fn master_path(&self) -> PathBuf {
        self.data_dir.join("master.json")
    }

    pub fn multipliers_path(&self) -> PathBuf {
        self.data_dir.join("cp_multipliers.json")
    }
}
