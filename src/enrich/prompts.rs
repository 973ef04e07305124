//! Prompt text sent to the text generator

use crate::clients::CompletionRequest;
use crate::pillar::{Pillar, PillarResponses};

pub const SUGGESTION_SYSTEM: &str = "You are a helpful assistant that provides concise, thoughtful suggestions for ikigai self-discovery. Respond with only a comma-separated list of suggestions, no explanations or other text.";

pub const TIPS_SYSTEM: &str = "You are a career coach specializing in ikigai-based workplace development. Provide 5-7 specific, actionable tips for professional growth based on the user's ikigai responses. Each tip should be 1-2 sentences, practical, and directly tied to their responses. Format as a numbered list with no additional text.";

const SUGGESTION_MAX_TOKENS: u32 = 200;
const TIPS_MAX_TOKENS: u32 = 500;

pub fn suggestion_prompt(text: &str, pillar: Pillar) -> String {
    let ask = match pillar {
        Pillar::Love => {
            "about what they love, suggest 3-5 clarifying words or phrases that might help them explore this passion more deeply"
        }
        Pillar::GoodAt => {
            "about what they're good at, suggest 3-5 clarifying skills or talents that might be related"
        }
        Pillar::WorldNeeds => {
            "about what the world needs, suggest 3-5 clarifying societal needs or problems that might be related"
        }
        Pillar::PaidFor => {
            "about what they can be paid for, suggest 3-5 clarifying job roles, services, or business opportunities that might be related"
        }
    };
    format!(
        "Based on the user's input: '{}' {}. Format as a simple comma-separated list.",
        text.trim(),
        ask
    )
}

pub fn suggestion_request(text: &str, pillar: Pillar) -> CompletionRequest {
    CompletionRequest::new(suggestion_prompt(text, pillar))
        .with_system(SUGGESTION_SYSTEM)
        .with_max_tokens(SUGGESTION_MAX_TOKENS)
}

/// One "Title Case Pillar: a, b" line per pillar in canonical order
pub fn render_responses(responses: &PillarResponses) -> String {
    Pillar::ALL
        .iter()
        .map(|p| format!("{}: {}\n", p.title(), responses.get(*p).join(", ")))
        .collect()
}

pub fn tips_request(responses: &PillarResponses) -> CompletionRequest {
    let prompt = format!(
        "Based on the following ikigai responses, provide 5-7 actionable workplace growth tips:\n\n{}",
        render_responses(responses)
    );
    CompletionRequest::new(prompt)
        .with_system(TIPS_SYSTEM)
        .with_max_tokens(TIPS_MAX_TOKENS)
}
