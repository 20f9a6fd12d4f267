//! Pipeline orchestration for the positioning engine.
//!
//! This crate ties collection, prompt assembly, generation with repair, and
//! rendering into stage entry points and the end-to-end run (`coordinate`).

pub mod artifacts;
pub mod generation;
pub mod pipeline;
pub mod prompt;
pub mod repair;

pub use generation::{AnthropicClient, GenerationClient, OpenRouterClient, ProviderClient};
pub use pipeline::{
    CompetitorTarget, ProgressReporter, RenderedDocument, RunRequest, RunSummary, SilentProgress,
    Stages, SynthesisRequest, collect_company, coordinate, parse_competitor_pair, render,
    synthesize,
};
pub use prompt::{Prompt, ReferenceCorpus, assemble_prompt};
pub use repair::{parse_and_validate, run_with_repair};
