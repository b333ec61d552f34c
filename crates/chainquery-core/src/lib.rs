//! # ChainQuery Core
//!
//! Query understanding for on-chain questions.
//!
//! A free-form question ("what's the balance of vitalik.eth?") goes through
//! the [`Extractor`] for intent and entities, then the [`QueryAssembler`]
//! picks an endpoint template and emits a [`RequestDescriptor`] ready for an
//! [`ApiExecutor`].

pub mod assembler;
pub mod config;
pub mod error;
pub mod executor;
pub mod extractor;
pub mod llm;
pub mod models;
pub mod patterns;
pub mod registry;
pub mod resolver;

pub use assembler::QueryAssembler;
pub use crate::config::{ChainQueryConfig, LlmConfig, ResolverConfig};
pub use error::*;
pub use executor::*;
pub use extractor::{ExtractionMode, Extractor};
pub use llm::{ChatModel, OpenAiChatModel};
pub use models::*;
pub use registry::*;
pub use resolver::{HttpNameResolver, NameResolver};
