//! Rules engine for guiding the storyteller of a hidden-role table game.
//!
//! The engine tracks every seat's secret role and status, resolves night
//! abilities in wake order, and tells the storyteller what to do and say.
//! It never renders anything: seat layout, dialogs, and input handling
//! live outside and talk to the engine through
//! [`engine::protocol::EngineCommand`].

pub mod engine;
pub mod model;
