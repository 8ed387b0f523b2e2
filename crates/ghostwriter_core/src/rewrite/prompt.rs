use super::RewriteRequest;

const PROMPT_PREAMBLE: &str = "You are an expert Ghostwriter.";
const PROMPT_TRAILER: &str = "Output only the polished text. No conversational filler.";

/// Builds the model prompt for one rewrite request.
pub fn build_prompt(request: &RewriteRequest) -> String {
    format!(
        "{PROMPT_PREAMBLE}\n{}\n{}\nText: \"{}\"\n{PROMPT_TRAILER}",
        request.style.instruction(),
        request.language.instruction(),
        request.text
    )
}
