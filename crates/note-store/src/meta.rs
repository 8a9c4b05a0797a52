//! Note header block.

use crate::error::{NoteError, NoteResult};
use crate::tags::{parse_tags, serialize_tags};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Format of `date` and `modified` header values.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Metadata carried in the header of every note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub title: String,
    /// Optional link; empty means absent.
    pub href: String,
    pub date: NaiveDateTime,
    pub modified: Option<NaiveDateTime>,
    pub tags: Vec<String>,
}

impl Meta {
    pub fn new(date: NaiveDateTime) -> Self {
        Self {
            title: String::new(),
            href: String::new(),
            date,
            modified: None,
            tags: Vec::new(),
        }
    }

    /// Serialize to header lines (without the `---` fences).
    pub fn to_yaml(&self) -> NoteResult<String> {
        let mut out = String::new();
        if !self.title.is_empty() {
            out.push_str(&yaml_line("title", &self.title)?);
        }
        out.push_str(&format!("date: {}\n", format_time(&self.date)));
        if let Some(modified) = &self.modified {
            out.push_str(&format!("modified: {}\n", format_time(modified)));
        }
        if !self.tags.is_empty() {
            out.push_str(&yaml_line("tags", &serialize_tags(&self.tags))?);
        }
        if !self.href.is_empty() {
            out.push_str(&yaml_line("href", &self.href)?);
        }
        Ok(out)
    }

    /// Parse header lines (without the `---` fences).
    pub fn from_yaml(yaml: &str) -> NoteResult<Self> {
        if yaml.trim().is_empty() {
            return Err(NoteError::MissingDate);
        }
        let header: RawHeader = serde_yaml::from_str(yaml)?;

        let date = match header.date.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => parse_time(value)?,
            _ => return Err(NoteError::MissingDate),
        };
        let modified = match header.modified.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Some(parse_time(value)?),
            _ => None,
        };

        Ok(Self {
            title: header.title.unwrap_or_default(),
            href: header.href.map(|h| h.trim().to_string()).unwrap_or_default(),
            date,
            modified,
            tags: header.tags.map(tags_from_yaml).transpose()?.unwrap_or_default(),
        })
    }
}

/// Header as it appears in YAML, before validation.
#[derive(Debug, Deserialize)]
struct RawHeader {
    title: Option<String>,
    href: Option<String>,
    date: Option<String>,
    modified: Option<String>,
    /// Inline string or list; scalars of any type are taken as text.
    tags: Option<Value>,
}

fn tags_from_yaml(value: Value) -> NoteResult<Vec<String>> {
    match value {
        Value::Sequence(items) => {
            let mut tags = Vec::new();
            for item in items {
                let text = scalar_text(item).ok_or(NoteError::InvalidTags)?;
                tags.extend(parse_tags(&text));
            }
            Ok(tags)
        }
        value => scalar_text(value)
            .map(|text| parse_tags(&text))
            .ok_or(NoteError::InvalidTags),
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// Emit a single `key: value` line with YAML quoting applied to the value.
fn yaml_line(key: &str, value: &str) -> NoteResult<String> {
    let mut map = BTreeMap::new();
    map.insert(key, value);
    Ok(serde_yaml::to_string(&map)?)
}

pub fn format_time(time: &NaiveDateTime) -> String {
    time.format(DATE_FORMAT).to_string()
}

pub fn parse_time(value: &str) -> NoteResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT).map_err(|source| NoteError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_to_yaml_field_order() {
        let mut meta = Meta::new(date(12, 0, 0));
        meta.title = "Hello World".to_string();
        meta.modified = Some(date(13, 30, 5));
        meta.tags = vec!["work".to_string(), "proj/a".to_string()];
        meta.href = "https://example.com".to_string();

        assert_eq!(
            meta.to_yaml().unwrap(),
            "title: Hello World\n\
             date: 2024-01-01 12:00:00\n\
             modified: 2024-01-01 13:30:05\n\
             tags: work, proj/a\n\
             href: https://example.com\n"
        );
    }

    #[test]
    fn test_to_yaml_minimal() {
        let meta = Meta::new(date(8, 5, 9));
        assert_eq!(meta.to_yaml().unwrap(), "date: 2024-01-01 08:05:09\n");
    }

    #[test]
    fn test_title_is_quoted_when_needed() {
        let mut meta = Meta::new(date(12, 0, 0));
        meta.title = "key: value".to_string();
        let yaml = meta.to_yaml().unwrap();
        assert_ne!(yaml.lines().next(), Some("title: key: value"));
        assert_eq!(Meta::from_yaml(&yaml).unwrap().title, "key: value");
    }

    #[test]
    fn test_from_yaml() {
        let meta = Meta::from_yaml(
            "title: Hello\ndate: 2024-01-01 12:00:00\ntags: a, b/c\nhref: \" https://x.org \"",
        )
        .unwrap();
        assert_eq!(meta.title, "Hello");
        assert_eq!(meta.date, date(12, 0, 0));
        assert_eq!(meta.modified, None);
        assert_eq!(meta.tags, vec!["a", "b/c"]);
        assert_eq!(meta.href, "https://x.org");
    }

    #[test]
    fn test_from_yaml_tag_list() {
        let meta = Meta::from_yaml("date: 2024-01-01 12:00:00\ntags:\n  - a\n  - b/c\n").unwrap();
        assert_eq!(meta.tags, vec!["a", "b/c"]);
    }

    #[test]
    fn test_from_yaml_scalar_tags() {
        let meta = Meta::from_yaml("date: 2024-01-01 12:00:00\ntags: 2024").unwrap();
        assert_eq!(meta.tags, vec!["2024"]);

        let meta =
            Meta::from_yaml("date: 2024-01-01 12:00:00\ntags:\n  - 2024\n  - true\n  - a/b\n")
                .unwrap();
        assert_eq!(meta.tags, vec!["2024", "true", "a/b"]);

        let meta = Meta::from_yaml("date: 2024-01-01 12:00:00\ntags:\n").unwrap();
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn test_from_yaml_nested_tags_rejected() {
        assert!(matches!(
            Meta::from_yaml("date: 2024-01-01 12:00:00\ntags:\n  a: b\n"),
            Err(NoteError::InvalidTags)
        ));
        assert!(matches!(
            Meta::from_yaml("date: 2024-01-01 12:00:00\ntags:\n  - [a, b]\n"),
            Err(NoteError::InvalidTags)
        ));
    }

    #[test]
    fn test_from_yaml_missing_date() {
        assert!(matches!(Meta::from_yaml(""), Err(NoteError::MissingDate)));
        assert!(matches!(
            Meta::from_yaml("title: x"),
            Err(NoteError::MissingDate)
        ));
    }

    #[test]
    fn test_from_yaml_invalid_date() {
        assert!(matches!(
            Meta::from_yaml("date: yesterday"),
            Err(NoteError::InvalidDate { .. })
        ));
    }
}
