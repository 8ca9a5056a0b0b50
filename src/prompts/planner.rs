use crate::ingest::ProcessedField;

const INTRO: &str = "You are AI AGENT ACADEMIC ASSISTANT #1 OUT OF 2. Your job is to do EXACTLY AS FOLLOWED:";
const STEPS: &[&str] = &[
    "Read all the information in the task sheet (whether from file or text). Take your time, make sure you get ALL information.",
    "If provided, read the assessment rubric/criteria/marking guide. You must deeply analyse this.",
    "If provided, read the specific instructions. Take note of these.",
    "If provided, read the past work/s. Take descriptive note of this, the users style, small writing quirks, originality, etc.",
    "If provided, read the additional materials (lecture slides, class powerpoints, readings, homework, etc). These are CRUCIAL for context and understanding the course content. Pay special attention to these materials as they often contain the specific sources, theories, and concepts that should be referenced in the assessment.",
    "Once done all these steps OUTPUT this all down. Structure your output clearly with headings for each section.",
];
const OUTPUT_NOTES: &[&str] = &[
    "Use the additional materials (if provided) to identify specific theories, frameworks, or concepts that should be incorporated.",
    "If additional materials are provided, prioritize information and sources found within them.",
    "State the target word count (or range, or maximum) exactly as the task sheet gives it.",
];

const USER_HEADER: &str = "Here is the assessment information:\n\n";
const NOT_PROVIDED: &str = "Not provided.";
const NOTHING_EXTRACTED: &str = "No content could be extracted from this file.";

/// Stage 1 instruction header.
pub fn build_system_prompt() -> String {
    let steps = STEPS
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n");

    let notes = OUTPUT_NOTES
        .iter()
        .map(|note| format!("    - {}", note))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{INTRO}\n{steps}\n{notes}")
}

/// Every field under its own heading, in the order given.
pub fn build_user_content(fields: &[ProcessedField]) -> String {
    let mut content = String::from(USER_HEADER);
    for field in fields {
        content.push_str(&format!(
            "**{} ({}):**\n",
            field.kind.display_name(),
            field.source_label()
        ));
        let body = if !field.provided {
            NOT_PROVIDED
        } else {
            match field.extracted_text.as_deref() {
                Some(text) if !text.is_empty() => text,
                _ => NOTHING_EXTRACTED,
            }
        };
        content.push_str(body);
        content.push_str("\n\n");
    }
    content
}
