use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::aggregate::TagSet;
use crate::error::{StorageError, StorageResult};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(super) struct ListAllMyBucketsResult {
    pub(super) buckets: BucketList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(super) struct BucketList {
    pub(super) bucket: Vec<BucketEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(super) struct BucketEntry {
    pub(super) name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(super) struct ListBucketV2Result {
    pub(super) contents: Vec<ObjectEntry>,
    pub(super) is_truncated: bool,
    pub(super) next_continuation_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(super) struct ObjectEntry {
    pub(super) key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(super) struct AccessControlPolicy {
    pub(super) owner: Option<Owner>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(super) struct Owner {
    pub(super) display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(super) struct Tagging {
    pub(super) tag_set: TagSetXml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(super) struct TagSetXml {
    pub(super) tag: Vec<Tag>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(super) struct Tag {
    pub(super) key: String,
    pub(super) value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub(super) struct ErrorBody {
    pub(super) code: String,
    pub(super) message: String,
}

impl Tagging {
    pub(super) fn into_tags(self) -> TagSet {
        self.tag_set
            .tag
            .into_iter()
            .map(|tag| (tag.key, tag.value))
            .collect()
    }
}

impl AccessControlPolicy {
    /// Owner display name, `None` when absent or blank.
    pub(super) fn owner_name(self) -> Option<String> {
        self.owner
            .and_then(|owner| owner.display_name)
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
    }
}

pub(super) fn decode<T>(operation: &'static str, body: &str) -> StorageResult<T>
where
    T: DeserializeOwned,
{
    quick_xml::de::from_str(body).map_err(|err| StorageError::Decode {
        operation,
        source: err,
    })
}
