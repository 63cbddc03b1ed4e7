// Prompts for turning free-text transcriptions into log records.

use crate::ingest::extractor::ExtractionMeta;

pub const EXTRACTION_SYSTEM: &str = "You are a construction site records assistant. \
    You convert spoken or written site reports into structured activity log records. \
    You MUST respond with valid JSON only, with no markdown fences and no commentary.";

pub fn build_extraction_prompt(text: &str, meta: &ExtractionMeta) -> String {
    let mut context = String::new();
    if let Some(title) = &meta.title {
        context.push_str(&format!("Source title: {title}\n"));
    }
    if let Some(date) = meta.recorded_date {
        context.push_str(&format!("Recorded on: {date}\n"));
    }
    if let Some(location) = &meta.location {
        context.push_str(&format!("Site location: {location}\n"));
    }

    format!(
        r#"Extract every distinct site activity from the transcription below.

{context}
Return a JSON object with this exact shape:
{{
  "logs": [
    {{
      "timestamp": "ISO-8601 timestamp if stated, otherwise omit",
      "location": "where on site the activity happened",
      "category": "trade or work category, e.g. Concrete, Electrical, Safety",
      "activityType": "short activity name, e.g. Pour, Inspection, Delivery",
      "notes": "one or two sentences describing what happened",
      "material": "material involved, if any",
      "equipment": ["equipment used"],
      "personnel": ["people or crews named"],
      "status": "planned | in_progress | completed | delayed | cancelled"
    }}
  ]
}}

Rules:
- Omit fields the transcription does not support. Do not invent names or times.
- One record per activity. Keep the order in which activities are described.

TRANSCRIPTION:
{text}"#
    )
}
