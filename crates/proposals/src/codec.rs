//! Byte format of stored proposal records
//!
//! A record is stored as a JSON object holding `content`, `timestamp`,
//! `author`, `category`, `upvotes` and `downvotes`. The id is not part of the
//! payload; it is the suffix of the key the payload lives under. Vote
//! counters that are absent or null read as zero, which keeps payloads
//! written before counters existed readable.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{DecodeError, ProposalResult};
use crate::types::{Category, ProposalRecord};

/// Well-known key holding the proposal index
pub const INDEX_KEY: &str = "proposal_keys";

const RECORD_KEY_PREFIX: &str = "proposal_";

const REQUIRED_FIELDS: [&str; 4] = ["content", "timestamp", "author", "category"];

/// Backend key for the record with the given id
pub fn record_key(id: &str) -> String {
    format!("{}{}", RECORD_KEY_PREFIX, id)
}

#[derive(Serialize, Deserialize)]
struct StoredProposal {
    content: String,
    timestamp: u64,
    author: String,
    category: Category,
    #[serde(default, deserialize_with = "null_as_zero")]
    upvotes: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    downvotes: u64,
    #[serde(flatten)]
    extensions: Map<String, Value>,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Serialize a record into its stored form
pub fn encode_record(record: &ProposalRecord) -> ProposalResult<Vec<u8>> {
    let stored = StoredProposal {
        content: record.content.clone(),
        timestamp: record.timestamp,
        author: record.author.clone(),
        category: record.category,
        upvotes: record.upvotes,
        downvotes: record.downvotes,
        extensions: record.extensions.clone(),
    };
    Ok(serde_json::to_vec(&stored)?)
}

/// Read back the record stored for `id`
pub fn decode_record(id: &str, bytes: &[u8]) -> Result<ProposalRecord, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| DecodeError::Malformed("expected a JSON object".to_string()))?;
    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .find(|field| object.get(**field).map_or(true, Value::is_null))
    {
        return Err(DecodeError::MissingField(*missing));
    }

    let stored: StoredProposal = serde_json::from_value(value)
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    Ok(ProposalRecord {
        id: id.to_string(),
        content: stored.content,
        timestamp: stored.timestamp,
        author: stored.author,
        category: stored.category,
        upvotes: stored.upvotes,
        downvotes: stored.downvotes,
        extensions: stored.extensions,
    })
}

/// Serialize the ordered list of proposal ids
pub fn encode_index(keys: &[String]) -> ProposalResult<Vec<u8>> {
    Ok(serde_json::to_vec(keys)?)
}

/// Read back the ordered list of proposal ids
pub fn decode_index(bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ProposalRecord {
        let mut record = ProposalRecord::new(
            "1700000000000-k3j9x0a",
            "FHE-eyJ0aXRsZSI6IiJ9",
            1_700_000_000,
            "0x52908400098527886E0F7030069857D2E4169EE7",
            Category::Healthcare,
        );
        record.upvotes = 4;
        record.downvotes = 1;
        record
    }

    #[test]
    fn round_trip_preserves_record() {
        let record = sample();
        let bytes = encode_record(&record).unwrap();
        assert_eq!(decode_record(&record.id, &bytes).unwrap(), record);
    }

    #[test]
    fn counters_are_stored_as_integers() {
        let bytes = encode_record(&sample()).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["upvotes"], json!(4));
        assert_eq!(value["timestamp"], json!(1_700_000_000u64));
        assert_eq!(value["category"], json!("Healthcare"));
        assert!(value.get("id").is_none());
    }

    #[test]
    fn absent_counters_default_to_zero() {
        let bytes = serde_json::to_vec(&json!({
            "content": "FHE-abc",
            "timestamp": 12,
            "author": "0xabc",
            "category": "Education",
            "downvotes": null,
        }))
        .unwrap();

        let record = decode_record("a", &bytes).unwrap();
        assert_eq!(record.upvotes, 0);
        assert_eq!(record.downvotes, 0);
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let bytes = serde_json::to_vec(&json!({
            "content": "FHE-abc",
            "timestamp": 12,
            "author": "0xabc",
            "category": "Economy",
            "upvotes": 1,
            "downvotes": 2,
            "region": "north",
        }))
        .unwrap();

        let record = decode_record("a", &bytes).unwrap();
        assert_eq!(record.extensions.get("region"), Some(&json!("north")));

        let reencoded: Value = serde_json::from_slice(&encode_record(&record).unwrap()).unwrap();
        assert_eq!(reencoded["region"], json!("north"));
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert_eq!(decode_record("a", b""), Err(DecodeError::Empty));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(decode_record("a", b"{not json"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode_record("a", b"[1,2]"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode_record("a", &[0xff, 0xfe]), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn missing_field_is_named() {
        let bytes = serde_json::to_vec(&json!({
            "content": "FHE-abc",
            "timestamp": 12,
            "category": "Economy",
        }))
        .unwrap();
        assert_eq!(decode_record("a", &bytes), Err(DecodeError::MissingField("author")));
    }

    #[test]
    fn wrong_types_are_malformed() {
        let bytes = serde_json::to_vec(&json!({
            "content": "FHE-abc",
            "timestamp": "yesterday",
            "author": "0xabc",
            "category": "Economy",
        }))
        .unwrap();
        assert!(matches!(decode_record("a", &bytes), Err(DecodeError::Malformed(_))));

        let bytes = serde_json::to_vec(&json!({
            "content": "FHE-abc",
            "timestamp": 12,
            "author": "0xabc",
            "category": "Sports",
        }))
        .unwrap();
        assert!(matches!(decode_record("a", &bytes), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn index_round_trip() {
        let keys = vec!["a".to_string(), "b".to_string()];
        assert_eq!(decode_index(&encode_index(&keys).unwrap()).unwrap(), keys);
        assert_eq!(decode_index(b""), Err(DecodeError::Empty));
        assert!(matches!(decode_index(b"{\"a\":1}"), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn record_keys_are_prefixed() {
        assert_eq!(record_key("17-abc"), "proposal_17-abc");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn extension_value() -> impl Strategy<Value = Value> {
            prop_oneof![
                any::<String>().prop_map(Value::from),
                any::<i64>().prop_map(Value::from),
                any::<bool>().prop_map(Value::from),
                Just(Value::Null),
            ]
        }

        prop_compose! {
            fn any_record()(
                id in "[0-9]{1,13}-[0-9a-z]{7}",
                content in any::<String>(),
                timestamp in any::<u64>(),
                author in any::<String>(),
                category in proptest::sample::select(Category::ALL.to_vec()),
                upvotes in any::<u64>(),
                downvotes in any::<u64>(),
                // Prefixed so no extension shadows a stored field
                extensions in proptest::collection::btree_map("x_[a-z_]{1,12}", extension_value(), 0..4)
            ) -> ProposalRecord {
                let mut record = ProposalRecord::new(id, content, timestamp, author, category);
                record.upvotes = upvotes;
                record.downvotes = downvotes;
                record.extensions = extensions.into_iter().collect();
                record
            }
        }

        proptest! {
            #[test]
            fn any_record_round_trips(record in any_record()) {
                let bytes = encode_record(&record).unwrap();
                prop_assert_eq!(decode_record(&record.id, &bytes).unwrap(), record);
            }

            #[test]
            fn any_index_round_trips(keys in proptest::collection::vec(any::<String>(), 0..16)) {
                let bytes = encode_index(&keys).unwrap();
                prop_assert_eq!(decode_index(&bytes).unwrap(), keys);
            }
        }
    }
}
