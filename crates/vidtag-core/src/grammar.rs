//! Prompt and reply grammar for the analysis request.
//!
//! The model is asked to answer in a loose `- Description: ...` / `- Tags: [...]`
//! layout. Replies are not guaranteed to follow it, so parsing never fails: a
//! missing or malformed field comes back empty.

use crate::types::Analysis;

/// Couples the instructional prompt with the rule that reads its reply.
pub trait ResponseGrammar: Send + Sync {
    fn prompt(&self) -> &str;
    fn parse(&self, text: &str) -> Analysis;
}

pub const DEFAULT_PROMPT: &str = r#"Given a short video description based on your observation of this video, generate:
1. A concise description (1 sentence, max 15 words) capturing the video's key visual and emotional elements.
2. A list of 2-5 tags (single words or short phrases) for filtering and context, focusing on appearance, emotion, and setting.

Example Input: "A man confidently speaking outdoors"
Example Output:
- Description: "A confident man speaking in an outdoor environment."
- Tags: ["man", "confident", "outdoor", "speaking"]

Provide the output in this format:
- Description: [your description]
- Tags: [tag1, tag2, tag3, ...]"#;

/// Finds the first line containing each marker, case-insensitively.
#[derive(Debug, Clone)]
pub struct MarkerGrammar {
    prompt: String,
    description_marker: String,
    tags_marker: String,
}

impl Default for MarkerGrammar {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT, "Description:", "Tags:")
    }
}

impl MarkerGrammar {
    pub fn new(
        prompt: impl Into<String>,
        description_marker: impl Into<String>,
        tags_marker: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            description_marker: description_marker.into(),
            tags_marker: tags_marker.into(),
        }
    }

    fn value_after<'a>(&self, text: &'a str, marker: &str) -> Option<&'a str> {
        let marker = marker.to_lowercase();
        text.lines().find_map(|line| {
            // Lowercasing can change byte lengths outside ASCII, so search
            // char-wise on the original line.
            find_ignore_case(line, &marker).map(|end| &line[end..])
        })
    }
}

impl ResponseGrammar for MarkerGrammar {
    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn parse(&self, text: &str) -> Analysis {
        let description = self
            .value_after(text, &self.description_marker)
            .map(clean_value)
            .unwrap_or_default();
        let tags = self
            .value_after(text, &self.tags_marker)
            .map(parse_tags)
            .unwrap_or_default();

        Analysis { description, tags }
    }
}

/// Byte offset just past the first case-insensitive occurrence of `needle`
/// (already lowercase) in `haystack`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.char_indices().find_map(|(start, _)| {
        let mut rest = haystack[start..].char_indices();
        let mut expected = needle.chars();
        loop {
            let Some(want) = expected.next() else {
                let end = rest.next().map(|(i, _)| start + i).unwrap_or(haystack.len());
                return Some(end);
            };
            let (_, got) = rest.next()?;
            if !got.to_lowercase().eq(want.to_lowercase()) {
                return None;
            }
        }
    })
}

fn strip_decoration(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '*'))
}

fn clean_value(value: &str) -> String {
    strip_decoration(value).to_string()
}

fn parse_tags(value: &str) -> Vec<String> {
    let value = value.trim();
    let list = match (value.find('['), value.rfind(']')) {
        (Some(open), Some(close)) if open < close => &value[open + 1..close],
        // unbalanced brackets: treat as unparsable
        (Some(_), _) | (None, Some(_)) => return Vec::new(),
        (None, None) => value,
    };

    list.split(',')
        .map(strip_decoration)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
