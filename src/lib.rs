//! Kino - Movie & TV Show Research Assistant
//!
//! A conversational agent that answers natural-language questions about
//! movies and TV shows by orchestrating an LLM with a small set of lookup
//! tools: general web search, a movie-info scraper, and YouTube video and
//! trailer search.
//!
//! # Overview
//!
//! Kino allows you to:
//! - Ask about any movie or TV show and get structured answers
//! - Find IMDb ratings, release years, directors, and synopses
//! - Search for trailers on YouTube
//! - Inspect the tool-call trace behind every answer
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `agent` - The tool-calling loop, model boundary, and tool catalog
//! - `lookup` - Lookup tool implementations (web, movie info, YouTube)
//! - `compose` - Deterministic answer composition from structured results
//! - `conversation` - Conversation history with per-turn tool traces
//!
//! # Example
//!
//! ```rust,no_run
//! use kino::agent::Agent;
//! use kino::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut agent = Agent::new(&settings)?;
//!
//!     let result = agent.process("Tell me about Interstellar").await;
//!     println!("{}", result.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod compose;
pub mod config;
pub mod conversation;
pub mod error;
pub mod lookup;
pub mod openai;

pub use error::{KinoError, Result};
