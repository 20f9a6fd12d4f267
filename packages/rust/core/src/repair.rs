//! Response validation and the bounded repair loop.
//!
//! ```text
//! Idle ─► AwaitingGeneration ─► Validating ─┬─► Success
//!              ▲                            ├─► Repairing ─┐ (budget left)
//!              └────────────────────────────┼──────────────┘
//!                                           └─► Failed       (budget spent)
//! ```
//!
//! Only schema failures are retried. Transport errors from the client end
//! the loop immediately.

use serde_json::Value;
use tracing::{error, info, instrument, warn};

use positioning_shared::{PositioningBrief, PositioningError, Result};

use crate::generation::GenerationClient;
use crate::prompt::Prompt;

/// Raw-response characters embedded in a repair prompt.
const REPAIR_EXCERPT_CHARS: usize = 3000;
/// Raw-response characters logged when the budget is spent.
const FAILURE_EXCERPT_CHARS: usize = 2000;

/// Remove one optional wrapping fenced block (with or without a language tag).
pub fn strip_fences(text: &str) -> &str {
    let mut cleaned = text.trim();
    if cleaned.starts_with("```") {
        cleaned = match cleaned.split_once('\n') {
            Some((_, rest)) => rest,
            None => &cleaned[3..],
        };
    }
    if let Some(inner) = cleaned.strip_suffix("```") {
        cleaned = inner;
    }
    cleaned.trim()
}

/// Parse a raw reply into a validated brief.
pub fn parse_and_validate(raw: &str) -> Result<PositioningBrief> {
    let value: Value = serde_json::from_str(strip_fences(raw))
        .map_err(|e| PositioningError::schema(format!("response is not valid JSON: {e}")))?;
    PositioningBrief::from_value(value)
}

/// Follow-up content asking the service to correct its previous reply.
pub fn build_repair_prompt(raw: &str, error: &str) -> String {
    format!(
        "Your previous response was not valid JSON. Error: {error}\n\n\
         Here is what you returned:\n{}\n\n\
         Please return ONLY the valid JSON positioning brief. No markdown fencing, no extra text.",
        head_chars(raw, REPAIR_EXCERPT_CHARS)
    )
}

fn head_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Submit `prompt` and validate the reply, re-prompting up to
/// `repair_attempts` times. The client is called at most
/// `repair_attempts + 1` times, one request at a time.
#[instrument(skip_all, fields(model = %model, repair_attempts = repair_attempts))]
pub async fn run_with_repair<C: GenerationClient>(
    client: &C,
    prompt: &Prompt,
    model: &str,
    repair_attempts: u32,
) -> Result<PositioningBrief> {
    let mut raw = client.submit(&prompt.instruction, &prompt.content, model).await?;
    let mut attempt: u32 = 0;

    loop {
        let message = match parse_and_validate(&raw) {
            Ok(brief) => {
                info!(attempt = attempt + 1, "generation output validated");
                return Ok(brief);
            }
            Err(PositioningError::SchemaValidation { message, .. }) => message,
            Err(other) => return Err(other),
        };

        warn!(attempt = attempt + 1, error = %message, "generation output rejected");

        if attempt >= repair_attempts {
            let excerpt = head_chars(&raw, FAILURE_EXCERPT_CHARS).to_string();
            error!(raw = %excerpt, "no valid brief after repair attempts");
            return Err(PositioningError::SchemaValidation {
                message: format!(
                    "{message} (after {} attempt{})",
                    attempt + 1,
                    if attempt == 0 { "" } else { "s" }
                ),
                excerpt: Some(excerpt),
            });
        }

        attempt += 1;
        info!(attempt, "sending repair prompt");
        let repair = build_repair_prompt(&raw, &message);
        raw = client.submit(&prompt.instruction, &repair, model).await?;
    }
}
