//! Wire model of the datapoints response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `[timestamp, value]` as sent by the backend.
pub type DataPoint = (Value, Value);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseBody {
    #[serde(default)]
    pub queries: Vec<QueryResponse>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub sample_size: u64,
    #[serde(default)]
    pub results: Vec<QueryResult>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub name: String,
    #[serde(default)]
    pub group_by: Vec<GroupByResult>,
    /// Tag name to the values present in this result, in response order
    #[serde(default)]
    pub tags: Map<String, Value>,
    #[serde(default)]
    pub values: Vec<DataPoint>,
}

/// One grouping applied to a result: `tag`, `value` or `time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupByResult {
    pub name: String,
    /// Group keys in response order; absent on some degenerate responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Map<String, Value>>,
}

impl GroupByResult {
    pub fn new(name: impl Into<String>, group: Value) -> Self {
        Self {
            name: name.into(),
            group: match group {
                Value::Object(map) => Some(map),
                _ => None,
            },
        }
    }
}
