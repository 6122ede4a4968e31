/// Frames retrieved text and the user's question as separate labeled
/// sections, context first.
pub fn compose_prompt(context: &str, question: &str) -> String {
    let context = context.trim_end_matches('\n');
    format!(
        "<retrieved_context>\n{}\n</retrieved_context>\n\n<question>\n{}\n</question>",
        context, question
    )
}
