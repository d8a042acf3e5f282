//! ClosureCast RAG
//!
//! Knowledge-grounded answers about closure risk.
//!
//! - [`Corpus`]: the static set of keyword-tagged knowledge snippets
//! - [`Retriever`]: ranks the corpus against a query; [`LexicalIndex`] is the
//!   keyword/substring overlap implementation
//! - [`ContextAssembler`]: joins the top documents (or a fallback set) and
//!   renders the prompt
//! - [`GenerationClient`]: calls a [`GenerationBackend`] such as
//!   [`GeminiBackend`] with a fixed-delay quota retry policy

pub mod context;
pub mod corpus;
pub mod gemini;
pub mod generation;
pub mod lexical;
pub mod retriever;

pub use context::{AssembledContext, ContextAssembler, PromptTemplate, DEFAULT_PROMPT_TEMPLATE};
pub use corpus::Corpus;
pub use gemini::{GeminiBackend, GeminiConfig};
pub use generation::{
    GenerationBackend, GenerationClient, RetryDecision, RetryPolicy, Sleeper, TokioSleeper,
};
pub use lexical::LexicalIndex;
pub use retriever::{Retriever, DEFAULT_TOP_K};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::context::ContextAssembler;
    pub use crate::corpus::Corpus;
    pub use crate::generation::{GenerationBackend, GenerationClient};
    pub use crate::lexical::LexicalIndex;
    pub use crate::retriever::Retriever;
}
