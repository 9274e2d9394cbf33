//! Application State & Configuration

use std::path::PathBuf;
use std::sync::Arc;

use agent_core::{Agent, MemorySessionStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Agent with its provider and tool registry
    pub agent: Arc<Agent>,

    /// Live sessions, one conversation each
    pub sessions: Arc<MemorySessionStore>,
}

impl AppState {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent: Arc::new(agent),
            sessions: Arc::new(MemorySessionStore::new()),
        }
    }
}

/// Listener and static asset settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            static_dir: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    /// `BIND_ADDR` and `STATIC_DIR` over the defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            static_dir: var("STATIC_DIR").map_or(defaults.static_dir, PathBuf::from),
        }
    }
}
