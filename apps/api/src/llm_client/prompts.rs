// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it;
// this file contains the cross-cutting pieces.

/// Default voice for narrative answers. Overridable via `CHAT_PERSONA`.
pub const SALES_ANALYST_PERSONA: &str = "\
Answer in the perspective of a sales analyst but don't say that 'As a sales analyst'.";
