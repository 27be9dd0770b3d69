/// Build the study-sheet prompt around a transcript
pub fn build_prompt(transcript: &str) -> String {
    let vocab_entry = r#"{"word": "Word", "meaning": "Meaning", "example": "Ex"}"#;
    let vocab = vec![vocab_entry; 10].join(",\n        ");

    format!(
        r#"You are an English Tutor. Analyze this:
"{transcript}"

OUTPUT JSON (No Markdown):
{{
    "summary": "3 sentences in natural Korean (~해요).",
    "vocab": [
        {vocab}
    ],
    "shadowing": [
        {{"level": "초급", "text": "..."}},
        {{"level": "중급", "text": "..."}},
        {{"level": "고급", "text": "..."}}
    ]
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_transcript() {
        let prompt = build_prompt("Hello world");
        assert!(prompt.contains("\"Hello world\""));
        assert!(prompt.starts_with("You are an English Tutor."));
        assert!(prompt.contains("No Markdown"));
    }

    #[test]
    fn test_prompt_schema_shape() {
        let prompt = build_prompt("text");
        assert_eq!(prompt.matches("\"word\": \"Word\"").count(), 10);
        for level in ["초급", "중급", "고급"] {
            assert_eq!(prompt.matches(level).count(), 1);
        }
        assert!(prompt.contains("natural Korean"));
    }
}
