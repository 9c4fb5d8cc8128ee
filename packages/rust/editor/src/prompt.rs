//! Two-message exchange sent for every edit.

use crate::chat::ChatMessage;

/// Language tag on the fence around the document.
const DOCUMENT_FENCE_LANG: &str = "xml";

/// Build the user message: the instruction, then the full document fenced.
pub fn user_message(instruction: &str, document: &str) -> String {
    format!(
        "Apply this specific change to the template: {instruction}\n\n\
         Template content:\n\n\
         ```{DOCUMENT_FENCE_LANG}\n{document}\n```"
    )
}

/// System message carrying the rules, followed by the user message.
pub fn build_messages(system_prompt: &str, instruction: &str, document: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(user_message(instruction, document)),
    ]
}
