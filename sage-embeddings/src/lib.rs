//! # sage-embeddings
//!
//! Dense-vector providers behind the [`EmbeddingProvider`] trait from
//! `sage-core`. The only production provider is [`HttpProvider`], a
//! blocking client for an OpenAI-compatible `/embeddings` endpoint.

mod http_provider;

pub use http_provider::HttpProvider;

pub use sage_core::traits::EmbeddingProvider;
