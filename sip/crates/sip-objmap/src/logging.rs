//! Object Map Logging
//!
//! Records structural events of a map (table creation, reorganisation,
//! displaced chains) and forwards them to the `log` facade.
//!
//! Log Levels:
//! - ERROR: allocation failures
//! - WARN: capacity ceiling reached, remove misses
//! - INFO: table creation, reorganisation
//! - DEBUG: displaced chains

use serde::Serialize;
use std::collections::VecDeque;

/// Log level for map events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    fn as_log(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Map event types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    /// Bucket array allocated
    TableCreated { size: usize },

    /// Table rebuilt, either at the same size or one prime larger
    Reorganised {
        old_size: usize,
        new_size: usize,
        grew: bool,
        occupied: usize,
        reclaimed_stale: usize,
    },

    /// A non-sharing add replaced the chain at an address
    Displaced { address: usize, count: usize },

    /// Growth was wanted but the largest size is already in use
    CapacityCeiling { size: usize },

    /// Remove found the record flagged as mapped but not in its chain
    RemoveMiss { address: usize },

    /// Bucket array allocation failed
    AllocationFailure { buckets: usize },
}

impl MapEvent {
    /// Log level of this event
    pub fn level(&self) -> LogLevel {
        match self {
            MapEvent::AllocationFailure { .. } => LogLevel::Error,
            MapEvent::CapacityCeiling { .. } | MapEvent::RemoveMiss { .. } => LogLevel::Warn,
            MapEvent::TableCreated { .. } | MapEvent::Reorganised { .. } => LogLevel::Info,
            MapEvent::Displaced { .. } => LogLevel::Debug,
        }
    }
}

/// Logger configuration
#[derive(Debug, Clone)]
pub struct MapLoggerConfig {
    /// Minimum log level
    pub level: LogLevel,

    /// Forward events to the `log` facade
    pub console: bool,

    /// Emit JSON instead of human-readable text
    pub json: bool,

    /// Prefix human-readable lines with a local timestamp
    pub timestamps: bool,

    /// Maximum number of events kept in memory (0 = unbounded)
    pub history: usize,
}

impl Default for MapLoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: true,
            json: false,
            timestamps: true,
            history: 1024,
        }
    }
}

/// Per-map event logger
#[derive(Debug)]
pub struct MapLogger {
    config: MapLoggerConfig,
    events: VecDeque<MapEvent>,
    enabled: bool,
}

impl MapLogger {
    /// Create new logger
    pub fn new(config: MapLoggerConfig) -> Self {
        Self {
            config,
            events: VecDeque::new(),
            enabled: true,
        }
    }

    /// Logger that drops every event
    pub fn disabled() -> Self {
        let mut logger = Self::new(MapLoggerConfig::default());
        logger.enabled = false;
        logger
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log a map event
    pub fn log(&mut self, event: MapEvent) {
        if !self.enabled || event.level() > self.config.level {
            return;
        }

        if self.config.console {
            self.output(&event);
        }

        if self.config.history > 0 && self.events.len() == self.config.history {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Events kept in memory, oldest first
    pub fn events(&self) -> &VecDeque<MapEvent> {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn output(&self, event: &MapEvent) {
        let level = event.level().as_log();
        if self.config.json {
            match serde_json::to_string(event) {
                Ok(line) => log::log!(target: "sip_objmap", level, "{}", line),
                Err(err) => log::warn!(target: "sip_objmap", "event serialization failed: {}", err),
            }
            return;
        }

        let line = Self::format_human(event);
        if self.config.timestamps {
            let now = chrono::Local::now();
            log::log!(
                target: "sip_objmap",
                level,
                "[{}] {}",
                now.format("%Y-%m-%d %H:%M:%S%.3f"),
                line
            );
        } else {
            log::log!(target: "sip_objmap", level, "{}", line);
        }
    }

    /// Human-readable rendering of an event
    pub fn format_human(event: &MapEvent) -> String {
        match event {
            MapEvent::TableCreated { size } => format!("[OM] Table created with {} buckets", size),
            MapEvent::Reorganised {
                old_size,
                new_size,
                grew,
                occupied,
                reclaimed_stale,
            } => format!(
                "[OM] Reorganised {} -> {} buckets ({}, {} occupied, {} stale reclaimed)",
                old_size,
                new_size,
                if *grew { "grown" } else { "compacted" },
                occupied,
                reclaimed_stale
            ),
            MapEvent::Displaced { address, count } => format!(
                "[OM] Address {:#x} reused, {} stale wrapper(s) displaced",
                address, count
            ),
            MapEvent::CapacityCeiling { size } => {
                format!("[OM] Largest table size {} reached, compacting only", size)
            },
            MapEvent::RemoveMiss { address } => {
                format!("[OM] Remove of unmapped record at {:#x}", address)
            },
            MapEvent::AllocationFailure { buckets } => {
                format!("[OM] Failed to allocate {} buckets", buckets)
            },
        }
    }
}

impl Default for MapLogger {
    fn default() -> Self {
        Self::new(MapLoggerConfig::default())
    }
}
