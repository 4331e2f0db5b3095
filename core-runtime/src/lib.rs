//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the mirror:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Progress events and event sinks
//!
//! ## Overview
//!
//! This crate contains the runtime utilities every other core crate depends
//! on. It establishes the logging conventions and the event reporting
//! mechanism used by the sync engine.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{EventBus, EventSink, FanoutSink, MirrorEvent, TracingEventSink};
pub use logging::{init_logging, LogFormat, LoggingConfig};
