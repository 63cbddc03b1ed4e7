// Prompts for the site log assistant.

use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM};

pub fn qa_system(deep_dive: bool) -> String {
    let depth = if deep_dive {
        "Give a thorough answer: walk through the relevant records in order, \
         point out patterns, delays and open risks, and end with a short summary."
    } else {
        "Answer concisely in a few sentences."
    };
    format!(
        "You are an assistant for a construction site activity log. {GROUNDING_INSTRUCTION} {depth}"
    )
}

pub fn build_question_prompt(question: &str, context: &str, video_title: Option<&str>) -> String {
    let source = video_title
        .map(|t| format!("Source: {t}\n\n"))
        .unwrap_or_default();
    format!("{source}SITE LOG RECORDS:\n{context}\n\nQUESTION:\n{question}")
}

pub fn questions_system() -> String {
    format!("{JSON_ONLY_SYSTEM} {GROUNDING_INSTRUCTION}")
}

pub fn build_questions_prompt(context: &str, video_title: Option<&str>) -> String {
    let source = video_title
        .map(|t| format!("Source: {t}\n\n"))
        .unwrap_or_default();
    format!(
        r#"{source}Write study questions about the site log records below, grouped by difficulty,
and answer each one from the records.

Return a JSON object with this exact shape:
{{
  "questionsAndAnswers": [
    {{
      "level": "basic | intermediate | advanced",
      "questions": [{{ "question": "...", "answer": "..." }}]
    }}
  ]
}}

Use three levels with three questions each.

SITE LOG RECORDS:
{context}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_dive_changes_system_prompt() {
        assert_ne!(qa_system(true), qa_system(false));
        assert!(qa_system(false).contains("concisely"));
    }

    #[test]
    fn test_question_prompt_layout() {
        let prompt = build_question_prompt("Who poured the slab?", "[..] Pour", Some("Day 1"));
        assert!(prompt.starts_with("Source: Day 1"));
        assert!(prompt.ends_with("Who poured the slab?"));
    }
}
