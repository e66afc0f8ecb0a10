//! Application services - orchestrate use cases.
//!
//! `GenerationService` drives a generation run; plugins interact with it
//! through `GeneratorApi`.

pub mod generation_service;
pub mod generator_api;
pub mod hooks;
pub mod source_mutator;

pub use generation_service::{GenerationReport, GenerationRequest, GenerationService};
pub use generator_api::{CliVersionRequirement, GenerationSettings, GeneratorApi};
pub use hooks::HookQueue;
pub use source_mutator::{ListEntry, SourceMutator};
