use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 清单中的一条 mock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockEntry {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl MockEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// mock 清单
///
/// 线上格式为 `{"Mocks": [{"Key": "...", "Value": "..."}]}`，
/// 也接受不带外层对象的数组。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockManifest {
    #[serde(rename = "Mocks")]
    pub mocks: Vec<MockEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestWire {
    Wrapped(MockManifest),
    Bare(Vec<MockEntry>),
}

impl MockManifest {
    pub fn parse(bytes: &[u8]) -> anyhow::Result<Self> {
        let bytes = bytes.strip_prefix("\u{feff}".as_bytes()).unwrap_or(bytes);
        let wire: ManifestWire =
            serde_json::from_slice(bytes).context("Mock manifest is not a list of Key/Value pairs")?;
        Ok(match wire {
            ManifestWire::Wrapped(manifest) => manifest,
            ManifestWire::Bare(mocks) => MockManifest { mocks },
        })
    }

    /// 转为查找表，重复的键以最后一条为准
    pub fn into_table(self) -> HashMap<String, String> {
        self.mocks
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped() {
        let manifest = MockManifest::parse(
            br#"{"Mocks":[{"Key":"AuthWorker","Value":"{\"Token\":\"a\"}"}]}"#,
        )
        .unwrap();
        assert_eq!(
            manifest.mocks,
            vec![MockEntry::new("AuthWorker", "{\"Token\":\"a\"}")]
        );
    }

    #[test]
    fn test_parse_bare_array_with_bom() {
        let mut bytes = "\u{feff}".as_bytes().to_vec();
        bytes.extend_from_slice(br#"[{"Key":"GET:users","Value":"[]"}]"#);
        let manifest = MockManifest::parse(&bytes).unwrap();
        assert_eq!(manifest.mocks.len(), 1);
        assert_eq!(manifest.mocks[0].key, "GET:users");
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let manifest = MockManifest {
            mocks: vec![MockEntry::new("k", "first"), MockEntry::new("k", "second")],
        };
        let table = manifest.into_table();
        assert_eq!(table.len(), 1);
        assert_eq!(table["k"], "second");
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(MockManifest::parse(b"{\"Key\":\"k\"}").is_err());
        assert!(MockManifest::parse(b"not json").is_err());
    }
}
