//! Message types for inter-layer communication in the actor-based architecture.
//!
//! This module defines all messages that flow between the UI, App, and Chain layers.

pub mod ui_events;
pub mod chain;
pub mod render;

pub use ui_events::UiEvent;
pub use chain::{ChainCommand, ChainResponse};
pub use render::RenderState;
