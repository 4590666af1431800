// leettools-mcp-core/src/lib.rs

#![doc = include_str!("../../README.md")]

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod locator;
pub mod models;
pub mod operations;
pub mod output;
pub mod processors;
pub mod runner;

pub use config::LeetConfig;
pub use dispatcher::{Dispatcher, serialize_response};
pub use errors::{ErrorCode, ErrorEnvelope, LeetError};
pub use locator::{ExecutableLocator, ExecutableProbe, ResolutionSource, ResolvedExecutable, SystemProbe};
pub use models::{ProcessOutcome, Response};
pub use operations::{CommandOptions, Operation};
pub use processors::{KnowledgeBaseListParser, NoopProcessor, StdoutProcessor};
pub use runner::run_process;
