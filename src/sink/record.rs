use super::SinkError;
use crate::detection::types::DetectionOutcome;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEVFILES_KEY: &str = "devfilesMap";
pub const DEVFILE_URLS_KEY: &str = "devfilesURLMap";
pub const DOCKERFILES_KEY: &str = "dockerfileContextMap";
pub const PORTS_KEY: &str = "componentPortsMap";
pub const REVISION_KEY: &str = "revision";
pub const ERROR_KEY: &str = "errorMap";

/// The published form of one detection outcome, keyed by
/// `(namespace, name)`.
///
/// Every map is stored as its JSON encoding under `binary_data`, base64
/// encoded when the record itself is serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub name: String,
    pub namespace: String,
    #[serde(with = "base64_map")]
    pub binary_data: BTreeMap<String, Vec<u8>>,
    pub published_at: DateTime<Utc>,
}

impl ResultRecord {
    pub fn from_outcome(
        name: &str,
        namespace: &str,
        outcome: &DetectionOutcome,
    ) -> Result<Self, SinkError> {
        let result = &outcome.result;
        let error_map: BTreeMap<&str, String> = outcome
            .error
            .iter()
            .map(|e| (e.kind().name(), e.to_string()))
            .collect();

        let mut binary_data = BTreeMap::new();
        binary_data.insert(DEVFILES_KEY.to_string(), serde_json::to_vec(&result.devfiles)?);
        binary_data.insert(
            DEVFILE_URLS_KEY.to_string(),
            serde_json::to_vec(&result.devfile_urls)?,
        );
        binary_data.insert(
            DOCKERFILES_KEY.to_string(),
            serde_json::to_vec(&result.dockerfiles)?,
        );
        binary_data.insert(PORTS_KEY.to_string(), serde_json::to_vec(&result.ports)?);
        binary_data.insert(REVISION_KEY.to_string(), result.revision.clone().into_bytes());
        binary_data.insert(ERROR_KEY.to_string(), serde_json::to_vec(&error_map)?);

        Ok(Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            binary_data,
            published_at: Utc::now(),
        })
    }

    fn decode<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, SinkError> {
        match self.binary_data.get(key) {
            Some(bytes) => serde_json::from_slice(bytes).map_err(|e| SinkError::Decode {
                key: key.to_string(),
                message: e.to_string(),
            }),
            None => Ok(T::default()),
        }
    }

    pub fn devfiles(&self) -> Result<BTreeMap<String, String>, SinkError> {
        self.decode(DEVFILES_KEY)
    }

    pub fn devfile_urls(&self) -> Result<BTreeMap<String, String>, SinkError> {
        self.decode(DEVFILE_URLS_KEY)
    }

    pub fn dockerfiles(&self) -> Result<BTreeMap<String, String>, SinkError> {
        self.decode(DOCKERFILES_KEY)
    }

    pub fn ports(&self) -> Result<BTreeMap<String, Vec<u16>>, SinkError> {
        self.decode(PORTS_KEY)
    }

    /// Error kind name to message. Empty on success.
    pub fn errors(&self) -> Result<BTreeMap<String, String>, SinkError> {
        self.decode(ERROR_KEY)
    }

    pub fn revision(&self) -> String {
        self.binary_data
            .get(REVISION_KEY)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }
}

mod base64_map {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let encoded: BTreeMap<&str, String> = map
            .iter()
            .map(|(k, v)| (k.as_str(), STANDARD.encode(v)))
            .collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Vec<u8>>, D::Error> {
        let encoded = BTreeMap::<String, String>::deserialize(deserializer)?;
        encoded
            .into_iter()
            .map(|(k, v)| {
                STANDARD
                    .decode(v.as_bytes())
                    .map(|bytes| (k, bytes))
                    .map_err(D::Error::custom)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::DetectionResult;
    use crate::error::DetectionError;
    use pretty_assertions::assert_eq;

    fn outcome() -> DetectionOutcome {
        let mut result = DetectionResult::new("main");
        result.devfile_urls.insert(
            "nodejs".into(),
            "https://raw.githubusercontent.com/o/r/main/nodejs/devfile.yaml".into(),
        );
        result.dockerfiles.insert("nodejs".into(), "Dockerfile".into());
        result.ports.insert("nodejs".into(), vec![3000]);
        DetectionOutcome {
            result,
            error: Some(DetectionError::no_devfile("python")),
        }
    }

    #[test]
    fn test_record_carries_all_keys() {
        let record = ResultRecord::from_outcome("app", "ns", &outcome()).unwrap();
        let keys: Vec<&str> = record.binary_data.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                PORTS_KEY,
                DEVFILES_KEY,
                DEVFILE_URLS_KEY,
                DOCKERFILES_KEY,
                ERROR_KEY,
                REVISION_KEY
            ]
        );
        assert_eq!(record.revision(), "main");
        assert_eq!(record.ports().unwrap()["nodejs"], vec![3000]);
        assert!(record.devfiles().unwrap().is_empty());
    }

    #[test]
    fn test_error_map_has_single_kind_entry() {
        let record = ResultRecord::from_outcome("app", "ns", &outcome()).unwrap();
        let errors = record.errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors["NoDevfileFound"],
            "unable to find devfile in the specified location python"
        );

        let success = DetectionOutcome::default();
        let record = ResultRecord::from_outcome("app", "ns", &success).unwrap();
        assert_eq!(record.binary_data[ERROR_KEY], b"{}".to_vec());
    }

    #[test]
    fn test_binary_data_is_base64_when_serialized() {
        let record = ResultRecord::from_outcome("app", "ns", &outcome()).unwrap();
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["binaryData"][REVISION_KEY], "bWFpbg==");

        let back: ResultRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
