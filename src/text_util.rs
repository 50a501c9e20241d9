/// Strip markdown code fences from LLM responses.
pub fn strip_code_fences(s: &str) -> &str {
    let s = s.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else if let Some(rest) = s.strip_prefix("```") {
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else {
        s
    }
}

/// Cut `s` to at most `max` characters, on a char boundary.
pub fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences_json() {
        assert_eq!(
            strip_code_fences("```json\n{\"key\": \"value\"}\n```"),
            "{\"key\": \"value\"}"
        );
    }

    #[test]
    fn test_strip_code_fences_plain() {
        assert_eq!(
            strip_code_fences("```\n{\"key\": \"value\"}\n```"),
            "{\"key\": \"value\"}"
        );
    }

    #[test]
    fn test_strip_code_fences_none() {
        assert_eq!(
            strip_code_fences("{\"key\": \"value\"}"),
            "{\"key\": \"value\"}"
        );
    }

    #[test]
    fn test_strip_code_fences_whitespace() {
        assert_eq!(strip_code_fences("  ```json\n{}\n```  "), "{}");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("", 3), "");
    }

    #[test]
    fn test_truncate_short_ticket_ids() {
        assert_eq!(truncate("t-1", 8), "t-1");
        assert_eq!(truncate("tickét-ñ-0042", 8), "tickét-ñ");
    }
}
