//! Narrative generation for Abyss Walker.
//!
//! The [`NarrativeService`] port abstracts a text-generation backend;
//! [`ChatCompletionsClient`] is the HTTP implementation. On top of the port
//! sit the [`SceneGenerator`], which validates scene replies against a
//! strict schema, and the [`CompanionAgent`], which turns a filtered view
//! of the game into one short line of dialogue. Both fall back to local
//! content whenever the service is missing or misbehaves.

pub mod client;
pub mod companion;
pub mod config;
pub mod error;
pub mod filter;
pub mod scene_gen;
pub mod service;

pub use client::ChatCompletionsClient;
pub use companion::{CompanionAgent, CompanionContext, CompanionDecision, DecisionSource, Emotion};
pub use config::ServiceConfig;
pub use error::{NarrativeError, NarrativeResult};
pub use filter::{ContentFilter, FilterConfig, FilterOutcome};
pub use scene_gen::{GeneratedScene, SceneGenerator, SceneRequest, SceneSource, fallback_scene};
pub use service::{CompletionRequest, NarrativeService, ReplyFormat};

#[cfg(any(test, feature = "testing"))]
pub use service::MockNarrativeService;
