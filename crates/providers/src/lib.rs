//! Generation model clients for Groundwire.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatModel;
