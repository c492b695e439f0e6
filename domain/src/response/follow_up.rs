//! Suggested follow-up question extraction

use super::cleanup::{FOLLOW_UP_MARKER, follow_up_section_start};

/// Most suggestions surfaced at once.
pub const MAX_FOLLOW_UP_QUESTIONS: usize = 5;

/// Pull suggested questions out of a raw response.
///
/// Collects the items under the follow-up header and any marker lines
/// elsewhere, without duplicates, up to [`MAX_FOLLOW_UP_QUESTIONS`].
pub fn extract_follow_up_questions(text: &str) -> Vec<String> {
    let section_start = follow_up_section_start(text);

    let marker_lines = text[..section_start.unwrap_or(text.len())]
        .lines()
        .filter(|line| line.contains(FOLLOW_UP_MARKER));

    let section_lines = section_start
        .map(|start| text[start..].lines().skip(1))
        .into_iter()
        .flatten();

    let mut questions: Vec<String> = Vec::new();
    for line in marker_lines.chain(section_lines) {
        let item = strip_list_prefix(line);
        if item.is_empty() || questions.iter().any(|q| q == item) {
            continue;
        }
        questions.push(item.to_string());
        if questions.len() == MAX_FOLLOW_UP_QUESTIONS {
            break;
        }
    }
    questions
}

/// Normalize an explicit suggestion list from the backend.
pub fn normalize_questions(questions: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for question in questions {
        let trimmed = question.trim();
        if !trimmed.is_empty() && !normalized.iter().any(|q| q == trimmed) {
            normalized.push(trimmed.to_string());
        }
    }
    normalized.truncate(MAX_FOLLOW_UP_QUESTIONS);
    normalized
}

fn strip_list_prefix(line: &str) -> &str {
    let trimmed = line
        .trim()
        .trim_start_matches(|c: char| {
            c == FOLLOW_UP_MARKER || matches!(c, '-' | '*' | '•' | '・' | '>' | ' ' | '\t')
        });
    let without_number = trimmed
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .strip_prefix(['.', ')', '、', '．'])
        .filter(|_| trimmed.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(trimmed);
    without_number.trim().trim_matches('*').trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_section_items() {
        let text = "本文\n\n## 次に聞いてみませんか\n- 寝かしつけのコツは？\n2. 何ヶ月で落ち着く？\n\n* **授乳の間隔は？**";
        assert_eq!(
            extract_follow_up_questions(text),
            vec!["寝かしつけのコツは？", "何ヶ月で落ち着く？", "授乳の間隔は？"]
        );
    }

    #[test]
    fn test_extracts_marker_lines_outside_section() {
        let text = "本文\n💬 ミルクの量は？\n続き";
        assert_eq!(extract_follow_up_questions(text), vec!["ミルクの量は？"]);
    }

    #[test]
    fn test_no_section_no_questions() {
        assert!(extract_follow_up_questions("ただの回答です。").is_empty());
    }

    #[test]
    fn test_caps_and_dedups() {
        let text = "関連する質問\n- a\n- a\n- b\n- c\n- d\n- e\n- f";
        assert_eq!(extract_follow_up_questions(text), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_number_prefix_only_stripped_when_present() {
        assert_eq!(strip_list_prefix("1. 質問"), "質問");
        assert_eq!(strip_list_prefix("3歳の食事は？"), "3歳の食事は？");
    }

    #[test]
    fn test_normalize_questions() {
        let questions = vec![" a ".to_string(), "".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(normalize_questions(questions), vec!["a", "b"]);
    }
}
