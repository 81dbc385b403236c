use super::{check_key, ResultRecord, ResultSink, SinkError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

type Key = (String, String);

/// In-process sink, used by tests and embedders that read results directly.
#[derive(Debug, Default)]
pub struct MemoryResultSink {
    records: Mutex<HashMap<Key, ResultRecord>>,
}

impl MemoryResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<Key, ResultRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

#[async_trait]
impl ResultSink for MemoryResultSink {
    async fn publish(&self, record: &ResultRecord) -> Result<(), SinkError> {
        check_key(&record.namespace, &record.name)?;
        self.records().insert(
            (record.namespace.clone(), record.name.clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn fetch(&self, namespace: &str, name: &str) -> Result<Option<ResultRecord>, SinkError> {
        Ok(self
            .records()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}
