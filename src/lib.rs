//! Reflex - Per-Tick Rule Automation Engine
//!
//! A host frame loop hands the engine an immutable world snapshot every
//! tick. The engine gates execution, evaluates the active profile's rule
//! groups, and applies the produced side effects through a retrying,
//! idempotence-aware queue before realizing the aggregated input and
//! overlay instructions through capability traits.

pub mod backend;
pub mod bridge;
pub mod core;
pub mod effect;
pub mod engine;
pub mod frame;
pub mod gate;
pub mod rules;
pub mod snapshot;
pub mod vars;

pub use crate::core::config::EngineConfig;
pub use crate::core::error::{ReflexError, Result};
pub use crate::effect::{ApplyOutcome, SideEffect};
pub use crate::engine::{Engine, TickReport};
pub use crate::rules::{ContextFlags, Group, Profile, Rule};
