/// Single-turn instruction for one short, fence-free snippet.
pub fn build_prompt(language: &str, topic: &str) -> String {
    format!(
        "You are a concise code tutor. Produce one {language} code snippet that helps practice \
         {topic}. Keep it under 10 lines if possible, max 15 lines. No surrounding commentary or \
         markdown fences, and avoid placeholders like ..."
    )
}
