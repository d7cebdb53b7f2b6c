use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Language tag a streamed tweet must carry to be accepted.
pub const ACCEPTED_LANGUAGE: &str = "en";

/// One harvested tweet.
///
/// Only the fields the harvester reads are typed. Everything else the API
/// returns is kept in `extra` so that JSON output reproduces the full payload.
///
/// # Examples
///
/// ```
/// use harvester_core::Record;
///
/// let json = serde_json::json!({
///     "created_at": "Wed Oct 10 20:19:24 +0000 2018",
///     "text": "hello &amp; welcome",
///     "lang": "en",
///     "id": 1050118621198921728u64,
///     "user": {"name": "Alice", "screen_name": "alice"}
/// });
///
/// let record = Record::from_unit(json).unwrap().normalized();
/// assert_eq!(record.text, "hello & welcome");
/// assert!(record.extra.contains_key("id"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Author of the tweet
    pub user: User,
    /// Creation timestamp as delivered by the API
    pub created_at: String,
    /// Body text
    pub text: String,
    /// All other fields of the payload, `lang` included
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Owner identity of a tweet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Display name
    pub name: String,
    /// Handle, without the leading `@`
    pub screen_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Builds a record from one unit delivered by the transport.
    ///
    /// Returns `None` for units without a `text` field (deletion notices,
    /// limit notices and other protocol messages) and for units whose
    /// typed fields are malformed.
    pub fn from_unit(unit: Value) -> Option<Self> {
        let has_text = unit
            .as_object()
            .is_some_and(|object| object.get("text").is_some_and(Value::is_string));
        if !has_text {
            return None;
        }
        serde_json::from_value(unit).ok()
    }

    /// Language tag detected by the API, if delivered as a string.
    pub fn lang(&self) -> Option<&str> {
        self.extra.get("lang").and_then(Value::as_str)
    }

    /// Returns true if the record carries the accepted language tag.
    pub fn is_accepted_language(&self) -> bool {
        self.lang() == Some(ACCEPTED_LANGUAGE)
    }

    /// Decodes HTML entities in the body text.
    pub fn normalized(mut self) -> Self {
        self.text = decode_entities(&self.text);
        self
    }
}

/// Decodes the `&gt;`, `&lt;` and `&amp;` entities the API escapes.
///
/// Text without entities is returned unchanged.
pub fn decode_entities(text: &str) -> String {
    text.replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tweet(text: &str, lang: &str) -> Value {
        json!({
            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
            "text": text,
            "lang": lang,
            "user": {"name": "Alice", "screen_name": "alice", "id": 7}
        })
    }

    #[test]
    fn test_from_unit_without_text_is_none() {
        let delete = json!({"delete": {"status": {"id": 1, "user_id": 2}}});
        assert!(Record::from_unit(delete).is_none());
    }

    #[test]
    fn test_from_unit_malformed_user_is_none() {
        let unit = json!({"text": "hi", "created_at": "now", "user": "alice"});
        assert!(Record::from_unit(unit).is_none());
    }

    #[test]
    fn test_from_unit_keeps_extra_fields() {
        let mut unit = tweet("hi", "en");
        unit["retweet_count"] = json!(3);

        let record = Record::from_unit(unit).unwrap();
        assert_eq!(record.extra.get("retweet_count"), Some(&json!(3)));
        assert_eq!(record.user.extra.get("id"), Some(&json!(7)));
    }

    #[test]
    fn test_language_filter() {
        let en = Record::from_unit(tweet("hi", "en")).unwrap();
        let es = Record::from_unit(tweet("hola", "es")).unwrap();
        assert!(en.is_accepted_language());
        assert!(!es.is_accepted_language());
    }

    #[test]
    fn test_missing_language_is_not_accepted() {
        let mut unit = tweet("hi", "en");
        unit.as_object_mut().unwrap().remove("lang");
        let record = Record::from_unit(unit).unwrap();
        assert!(!record.is_accepted_language());
    }

    #[test]
    fn test_lang_read_from_payload() {
        let record = Record::from_unit(tweet("hi", "es")).unwrap();
        assert_eq!(record.lang(), Some("es"));

        let mut unit = tweet("hi", "en");
        unit["lang"] = Value::Null;
        let record = Record::from_unit(unit).unwrap();
        assert_eq!(record.lang(), None);
        assert_eq!(record.extra.get("lang"), Some(&Value::Null));
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &gt; b &lt; c &amp; d"), "a > b < c & d");
    }

    #[test]
    fn test_decode_entities_idempotent_on_plain_text() {
        assert_eq!(decode_entities("a & b"), "a & b");
        assert_eq!(decode_entities(&decode_entities("x &lt;3")), "x <3");
    }
}
