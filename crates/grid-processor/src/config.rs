//! Configuration for the transform engine.

use serde::{Deserialize, Serialize};

/// Default warp/grid memory ceiling (8 GiB).
pub const DEFAULT_MEMORY_LIMIT_MB: usize = 8192;

/// Process-wide engine settings.
///
/// Built once at startup and handed to the engine; nothing reads these
/// values from global state afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads for warp/grid operations. `None` uses all CPUs.
    pub num_threads: Option<usize>,

    /// Allow multithreaded execution. When false a single thread is used.
    pub multithread: bool,

    /// Memory ceiling for a single warp/grid operation in megabytes.
    pub memory_limit_mb: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            multithread: true,
            memory_limit_mb: DEFAULT_MEMORY_LIMIT_MB,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("HAZARD_NUM_THREADS") {
            config.num_threads = parse_thread_count(&val);
        }

        if let Ok(val) = std::env::var("HAZARD_MULTITHREAD") {
            config.multithread = matches!(val.to_lowercase().as_str(), "true" | "yes" | "1");
        }

        if let Ok(val) = std::env::var("HAZARD_WARP_MEMORY_MB") {
            if let Ok(mb) = val.parse() {
                config.memory_limit_mb = mb;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_threads == Some(0) {
            return Err("num_threads must be > 0 (omit it to use all CPUs)".to_string());
        }

        if self.memory_limit_mb == 0 {
            return Err("memory_limit_mb must be > 0".to_string());
        }

        Ok(())
    }

    /// Number of worker threads actually used.
    pub fn effective_threads(&self) -> usize {
        if !self.multithread {
            return 1;
        }
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Get the memory ceiling in bytes.
    pub fn memory_limit_bytes(&self) -> usize {
        self.memory_limit_mb * 1024 * 1024
    }
}

/// Parse a thread count hint: "ALL_CPUS" (any case) or a positive number.
fn parse_thread_count(val: &str) -> Option<usize> {
    if val.eq_ignore_ascii_case("all_cpus") {
        return None;
    }
    val.parse().ok()
}
