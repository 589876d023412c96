//! Minimal INI reader for rule configs.
//!
//! Section and key names are case-insensitive; a key repeated within a
//! section keeps every value in order. An inline comment needs whitespace
//! before its `;`/`#` so URLs with fragments survive.

use crate::common::error::RuleConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn new(name: String) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    /// Every value recorded for `key`, in file order.
    pub fn values<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> + 'a {
        let key = key.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(move |(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value of `key`; shadows do not replace it.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values(key).next()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<Section>,
}

impl IniDocument {
    pub fn parse(content: &str) -> Result<Self, RuleConfigError> {
        let content = content.trim_start_matches('\u{feff}');
        let mut doc = IniDocument::default();
        // keys before any header land in the unnamed default section
        let mut current = doc.section_index("");

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let end = rest.find(']').ok_or_else(|| RuleConfigError::Syntax {
                    line: line_no,
                    reason: "unterminated section header".to_string(),
                })?;
                let name = rest[..end].trim().to_lowercase();
                current = doc.section_index(&name);
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(RuleConfigError::Syntax {
                    line: line_no,
                    reason: format!("expected key=value, got '{}'", line),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(RuleConfigError::Syntax {
                    line: line_no,
                    reason: "empty key".to_string(),
                });
            }
            let value = strip_inline_comment(value).trim();
            doc.sections[current]
                .entries
                .push((key.to_lowercase(), value.to_string()));
        }

        Ok(doc)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        let name = name.to_lowercase();
        self.sections.iter().find(|s| s.name == name)
    }

    /// Repeated headers reopen the existing section.
    fn section_index(&mut self, name: &str) -> usize {
        if let Some(pos) = self.sections.iter().position(|s| s.name == name) {
            return pos;
        }
        self.sections.push(Section::new(name.to_string()));
        self.sections.len() - 1
    }
}

fn strip_inline_comment(value: &str) -> &str {
    let bytes = value.as_bytes();
    for i in 1..bytes.len() {
        if (bytes[i] == b';' || bytes[i] == b'#') && bytes[i - 1].is_ascii_whitespace() {
            return &value[..i];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_keys_and_shadows() {
        let doc = IniDocument::parse(
            "\u{feff}; header comment\n[Custom]\nRuleSet=a,[]GEOIP,CN\n# note\nruleset = b,[]FINAL\n\n[other]\nk=v\n",
        )
        .unwrap();
        let custom = doc.section("custom").unwrap();
        assert_eq!(
            custom.values("ruleset").collect::<Vec<_>>(),
            vec!["a,[]GEOIP,CN", "b,[]FINAL"]
        );
        assert_eq!(custom.len(), 2);
        assert_eq!(doc.section("OTHER").unwrap().get("K"), Some("v"));
        assert!(doc.section("missing").is_none());
    }

    #[test]
    fn inline_comment_needs_leading_space() {
        let doc = IniDocument::parse(
            "[custom]\na=http://example.com/#frag ; trailing\nb=x;y\nc=value # note\n",
        )
        .unwrap();
        let s = doc.section("custom").unwrap();
        assert_eq!(s.get("a"), Some("http://example.com/#frag"));
        assert_eq!(s.get("b"), Some("x;y"));
        assert_eq!(s.get("c"), Some("value"));
    }

    #[test]
    fn first_value_wins_for_get() {
        let doc = IniDocument::parse("[s]\nflag=true\nflag=false\n").unwrap();
        assert_eq!(doc.section("s").unwrap().get("flag"), Some("true"));
    }

    #[test]
    fn reopened_section_accumulates() {
        let doc = IniDocument::parse("[s]\nk=1\n[t]\nk=2\n[S]\nk=3\n").unwrap();
        assert_eq!(
            doc.section("s").unwrap().values("k").collect::<Vec<_>>(),
            vec!["1", "3"]
        );
    }

    #[test]
    fn syntax_errors_carry_line_numbers() {
        assert_eq!(
            IniDocument::parse("[custom]\nruleset=a\njust some text\n").unwrap_err(),
            RuleConfigError::Syntax {
                line: 3,
                reason: "expected key=value, got 'just some text'".to_string(),
            }
        );
        assert!(matches!(
            IniDocument::parse("\n[custom\n").unwrap_err(),
            RuleConfigError::Syntax { line: 2, .. }
        ));
        assert!(matches!(
            IniDocument::parse("[custom]\n=value\n").unwrap_err(),
            RuleConfigError::Syntax { line: 2, .. }
        ));
    }
}
