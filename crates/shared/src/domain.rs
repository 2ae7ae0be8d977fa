use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Unique document-scoped identifier of one datapoint in the annotation tree.
///
/// The platform serializes tree ids as strings but lists updated datapoints
/// as bare integers; both deserialize into the same canonical string form so
/// membership checks compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DatapointId(pub String);

impl DatapointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for DatapointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DatapointId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(i64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Num(n) => DatapointId(n.to_string()),
            Raw::Str(s) => DatapointId(s),
        })
    }
}

/// Scalar payload of a leaf datapoint: the platform sends strings for
/// extracted text and numbers for enum values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Num(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::Num(n) => Cow::Owned(n.to_string()),
            Scalar::Float(f) => Cow::Owned(f.to_string()),
            Scalar::Str(s) => Cow::Borrowed(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Num(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldContent {
    pub value: Scalar,
}

impl FieldContent {
    pub fn new(value: impl Into<Scalar>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// One node of the annotation tree. Sections carry `children` and no
/// `content`; leaf datapoints carry `content` and no `children`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldNode {
    pub id: DatapointId,
    pub schema_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<FieldContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FieldNode>>,
}

impl FieldNode {
    /// Text form of the node's value; a node without content reads as empty.
    pub fn text_value(&self) -> Cow<'_, str> {
        match &self.content {
            Some(content) => content.value.as_text(),
            None => Cow::Borrowed(""),
        }
    }
}
