use regex::{Regex, RegexBuilder};

use crate::error::{Result, WorkerError};

// 表名/字段名通配符
// 支持 * ? 以及 sql LIKE 风格的 % _，不区分大小写
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(raw: &str) -> Result<Self> {
        let mut body = String::with_capacity(raw.len() + 8);
        for ch in raw.chars() {
            match ch {
                '*' | '%' => body.push_str(".*"),
                '?' | '_' => body.push('.'),
                _ => body.push_str(&regex::escape(ch.encode_utf8(&mut [0u8; 4]))),
            }
        }
        let regex = RegexBuilder::new(&format!("^{}$", body))
            .case_insensitive(true)
            .build()
            .map_err(|e| WorkerError::Config(format!("invalid pattern {:?}: {}", raw, e)))?;
        Ok(Pattern {
            raw: raw.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

// 编译一组通配符
pub fn compile_all(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns.iter().map(|p| Pattern::new(p)).collect()
}

pub fn matches_any(patterns: &[Pattern], name: &str) -> bool {
    patterns.iter().any(|p| p.is_match(name))
}

#[cfg(test)]
mod test_pattern {
    use super::*;

    #[test]
    fn test_star_matches_everything() {
        let p = Pattern::new("*").unwrap();
        assert!(p.is_match("parcels"));
        assert!(p.is_match(""));
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let p = Pattern::new("T*").unwrap();
        assert!(p.is_match("T1"));
        assert!(p.is_match("table"));
        assert!(!p.is_match("xT1"));
    }

    #[test]
    fn test_like_wildcards() {
        let p = Pattern::new("road%").unwrap();
        assert!(p.is_match("ROADS_2020"));
        let p = Pattern::new("T_").unwrap();
        assert!(p.is_match("T3"));
        assert!(!p.is_match("T33"));
    }

    #[test]
    fn test_regex_chars_are_literal() {
        let p = Pattern::new("a.b").unwrap();
        assert!(p.is_match("A.B"));
        assert!(!p.is_match("axb"));
        assert_eq!(p.as_str(), "a.b");
    }
}
