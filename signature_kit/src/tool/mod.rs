//! The external extraction tool: arguments, resolution and invocation

pub mod arguments;
pub mod cancellation;
pub mod flags;
pub mod invoker;
pub mod resolver;

pub use arguments::build as build_arguments;
pub use cancellation::{Cancellable, CancellationToken};
pub use flags::Flag;
pub use invoker::{ExecutionResult, SystemToolExecutor, ToolExecutor, SENTINEL_EXIT_CODE};
pub use resolver::{LocalToolResolver, ResolvedTool, ToolResolver, TOOL_HOME_ENV};
