//! Prompt templates sent to the completion endpoint.

use analyst_core::types::{ExecutionResult, Turn};

/// Build the instruction that folds prior turns and a follow-up question into
/// one self-contained question.
pub fn rewrite_prompt(history: &[Turn], question: &str) -> String {
    let transcript = history
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Below is a conversation between a user and a data assistant, followed by \
a new question from the user.\n\
Rewrite the new question so it can be understood without the conversation, \
carrying over any entities, filters or time ranges it refers to implicitly.\n\
Reply with the rewritten question only. Do not answer it and do not add any \
explanation.\n\n\
<conversation>\n{transcript}\n</conversation>\n\n\
<question>\n{question}\n</question>\n"
    )
}

/// Build the instruction that narrates an executed result set.
pub fn narration_prompt(question: &str, result: &ExecutionResult, statement: &str) -> String {
    format!(
        "You are a data assistant explaining the result of a query to a business user.\n\
Answer the question using only the result set below.\n\
Prefer short bullet points. Never state figures or facts that are not present \
in the result set. If the result set does not contain enough information to \
answer, say so explicitly.\n\n\
<question>\n{question}\n</question>\n\n\
<sql>\n{statement}\n</sql>\n\n\
<result rows=\"{rows}\">\n{table}\n</result>\n",
        rows = result.rows.len(),
        table = result.to_table(),
    )
}
