//! Pull candidate source out of a model response.

const FENCE: &str = "```";

/// Extract the code from a model response.
///
/// When the response contains a fenced block, only the first block's body is
/// returned (the info string after the opening fence is skipped; an unclosed
/// fence runs to the end). Otherwise the whole response is used. The result is
/// always trimmed.
pub fn extract_code(response: &str) -> String {
    let Some(start) = response.find(FENCE) else {
        return response.trim().to_string();
    };

    let after_open = &response[start + FENCE.len()..];
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        // ```code``` on a single line has no info string
        None => after_open,
    };

    let block = match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    };

    block.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_response_trimmed() {
        let code = extract_code("\n\n  import pandas as pd\ndef parse(p): ...  \n");
        assert_eq!(code, "import pandas as pd\ndef parse(p): ...");
    }

    #[test]
    fn test_python_fence() {
        let response = "Here you go:\n```python\nimport camelot\n\ndef parse(p):\n    return None\n```\nGood luck!";
        assert_eq!(extract_code(response), "import camelot\n\ndef parse(p):\n    return None");
    }

    #[test]
    fn test_bare_fence() {
        let response = "```\ndef parse(p): pass\n```";
        assert_eq!(extract_code(response), "def parse(p): pass");
    }

    #[test]
    fn test_first_block_only() {
        let response = "```py\nfirst = 1\n```\ntext\n```py\nsecond = 2\n```";
        assert_eq!(extract_code(response), "first = 1");
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let response = "```python\ndef parse(p):\n    pass\n";
        assert_eq!(extract_code(response), "def parse(p):\n    pass");
    }

    #[test]
    fn test_single_line_fence() {
        assert_eq!(extract_code("```x = 1```"), "x = 1");
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(extract_code(""), "");
        assert_eq!(extract_code("   \n\t"), "");
        assert_eq!(extract_code("```python\n```"), "");
    }
}
