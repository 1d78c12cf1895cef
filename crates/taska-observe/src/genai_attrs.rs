//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! These follow the OTel GenAI Semantic Conventions specification for
//! consistent instrumentation of chat backend calls. Span creation
//! spells its field names inline (the span macros take literal field
//! names); the constants here are the ones referenced at runtime.

// --- Recommended attributes ---

/// The provider's conversation correlation id.
pub const GEN_AI_CONVERSATION_ID: &str = "gen_ai.conversation.id";

// --- Operation name values ---

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";

// --- Provider name values ---

/// Dify provider identifier.
pub const PROVIDER_DIFY: &str = "dify";
