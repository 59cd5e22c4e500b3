use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::kernel::replay::DEFAULT_MAX_FRAMES;
use crate::kernel::state::DEFAULT_STALE_AFTER;

pub const ENV_ADDR: &str = "RELAY_ADDR";
pub const ENV_STALE_AFTER_MS: &str = "RELAY_STALE_AFTER_MS";
pub const ENV_MAX_FRAMES: &str = "RELAY_MAX_FRAMES";
pub const ENV_REPLAY_DIR: &str = "RELAY_REPLAY_DIR";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    /// Entries older than this are gone from the next poll.
    pub stale_after: Duration,
    /// Frames kept per recording. `0` keeps them all.
    pub max_frames: usize,
    /// When set, sealed replays are also written here and reloaded at boot.
    pub replay_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            stale_after: DEFAULT_STALE_AFTER,
            max_frames: DEFAULT_MAX_FRAMES,
            replay_dir: None,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(addr) = get(ENV_ADDR) {
            config.bind_addr = parse(ENV_ADDR, &addr)?;
        }
        if let Some(ms) = get(ENV_STALE_AFTER_MS) {
            config.stale_after = Duration::from_millis(parse(ENV_STALE_AFTER_MS, &ms)?);
        }
        if let Some(n) = get(ENV_MAX_FRAMES) {
            config.max_frames = parse(ENV_MAX_FRAMES, &n)?;
        }
        config.replay_dir = get(ENV_REPLAY_DIR).map(PathBuf::from);

        Ok(config)
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("invalid {}={:?}", key, value))
}
