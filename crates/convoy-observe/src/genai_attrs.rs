//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! These follow the OTel GenAI Semantic Conventions specification so model
//! and agent instrumentation stays consistent across the codebase. All
//! constants are string slices usable in `tracing::span!` and
//! `tracing::info_span!` field names.
//!
//! Span naming convention: `"{operation} {target}"` (e.g., `"invoke_agent researcher"`)

// --- Required attributes ---

/// The name of the operation being performed (e.g., "chat", "invoke_agent").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "anthropic").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

// --- Recommended attributes ---

/// The model ID requested.
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The finish reasons for the response (e.g., "stop", "tool_calls").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

// --- Agent-specific attributes ---

/// The display name of the agent handling the call.
pub const GEN_AI_AGENT_NAME: &str = "gen_ai.agent.name";

/// The name of the tool being executed.
pub const GEN_AI_TOOL_NAME: &str = "gen_ai.tool.name";

// --- Operation name values ---

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";

/// Agent invocation operation.
pub const OP_INVOKE_AGENT: &str = "invoke_agent";

/// One handoff edge in an agent chain.
pub const OP_HANDOFF: &str = "handoff";

/// Tool execution inside the tool-calling loop.
pub const OP_EXECUTE_TOOL: &str = "execute_tool";

/// Context summarization during window trimming.
pub const OP_SUMMARIZE_CONTEXT: &str = "summarize_context";
