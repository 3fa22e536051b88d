use crate::error::{Result, UploadError};
use crate::upload::types::{FileData, FileSource, FileUploadResult, UploadOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One member of a group before it is classified
#[derive(Debug, Clone, PartialEq)]
pub enum GroupItem {
    Data(FileData),
    Url(String),
    Uuid(String),
}

impl GroupItem {
    /// Classifies a string as a URL or a file uuid
    pub fn parse(value: &str) -> Result<Self> {
        if is_uuid(value) {
            Ok(GroupItem::Uuid(value.to_string()))
        } else if is_source_url(value) {
            Ok(GroupItem::Url(value.to_string()))
        } else {
            Err(UploadError::invalid_parameter(
                "data",
                format!("'{}' is neither a URL nor a file uuid", value),
            ))
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            GroupItem::Data(_) => "file data",
            GroupItem::Url(_) => "URL",
            GroupItem::Uuid(_) => "uuid",
        }
    }
}

impl From<FileData> for GroupItem {
    fn from(file: FileData) -> Self {
        GroupItem::Data(file)
    }
}

pub fn is_uuid(value: &str) -> bool {
    value.len() == 36
        && value.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}

fn is_source_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// A homogeneous group of files to upload
#[derive(Debug, Clone, PartialEq)]
pub enum GroupSource {
    Files(Vec<FileData>),
    Urls(Vec<String>),
    Uuids(Vec<String>),
}

impl GroupSource {
    /// Builds a group from loose items, rejecting mixed kinds
    pub fn from_items(items: Vec<GroupItem>) -> Result<Self> {
        let Some(first) = items.first() else {
            return Err(UploadError::invalid_parameter(
                "data",
                "Group must contain at least one file",
            ));
        };

        let source = match first {
            GroupItem::Data(_) => GroupSource::Files(Vec::with_capacity(items.len())),
            GroupItem::Url(_) => GroupSource::Urls(Vec::with_capacity(items.len())),
            GroupItem::Uuid(_) => GroupSource::Uuids(Vec::with_capacity(items.len())),
        };
        let expected = first.kind();

        items
            .into_iter()
            .try_fold(source, |mut source, item| {
                match (&mut source, item) {
                    (GroupSource::Files(files), GroupItem::Data(file)) => files.push(file),
                    (GroupSource::Urls(urls), GroupItem::Url(url)) => urls.push(url),
                    (GroupSource::Uuids(uuids), GroupItem::Uuid(uuid)) => uuids.push(uuid),
                    (_, other) => {
                        return Err(UploadError::invalid_parameter(
                            "data",
                            format!(
                                "Group uploading from mixed sources is not supported: found {} among {} items",
                                other.kind(),
                                expected
                            ),
                        ))
                    }
                }
                Ok(source)
            })
    }

    /// Classifies every string, then builds the group
    pub fn from_strings<S: AsRef<str>>(values: &[S]) -> Result<Self> {
        let items = values
            .iter()
            .map(|value| GroupItem::parse(value.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::from_items(items)
    }

    pub fn len(&self) -> usize {
        match self {
            GroupSource::Files(files) => files.len(),
            GroupSource::Urls(urls) => urls.len(),
            GroupSource::Uuids(uuids) => uuids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(UploadError::invalid_parameter(
                "data",
                "Group must contain at least one file",
            ));
        }

        match self {
            GroupSource::Files(files) => {
                if let Some(index) = files.iter().position(|file| file.data.is_empty()) {
                    return Err(UploadError::invalid_parameter(
                        "data",
                        format!("Group member {} has no data", index),
                    ));
                }
            }
            GroupSource::Urls(urls) => {
                if let Some(bad) = urls.iter().find(|url| !is_source_url(url)) {
                    return Err(UploadError::invalid_parameter(
                        "data",
                        format!("'{}' is not an http(s) URL", bad),
                    ));
                }
            }
            GroupSource::Uuids(uuids) => {
                if let Some(bad) = uuids.iter().find(|uuid| !is_uuid(uuid)) {
                    return Err(UploadError::invalid_parameter(
                        "data",
                        format!("'{}' is not a file uuid", bad),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn into_sources(self) -> Vec<FileSource> {
        match self {
            GroupSource::Files(files) => files.into_iter().map(FileSource::Data).collect(),
            GroupSource::Urls(urls) => urls.into_iter().map(FileSource::Url).collect(),
            GroupSource::Uuids(uuids) => uuids.into_iter().map(FileSource::Uuid).collect(),
        }
    }
}

/// Group descriptor returned by the Upload API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    pub id: String,
    #[serde(default)]
    pub datetime_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub datetime_stored: Option<DateTime<Utc>>,
    #[serde(default)]
    pub files_count: usize,
    #[serde(default)]
    pub cdn_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub files: Vec<Value>,
}

/// A created group together with its uploaded members, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct UploadGroup {
    pub info: GroupInfo,
    pub files: Vec<FileUploadResult>,
}

impl UploadGroup {
    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn uuids(&self) -> Vec<&str> {
        self.files.iter().map(|file| file.uuid.as_str()).collect()
    }
}

/// Options for a group upload
///
/// `upload.on_progress` receives the aggregated progress of all members and
/// `upload.cancel` aborts every member.
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    pub upload: UploadOptions,
    /// CDN operations applied to every member URL, e.g. `resize/x200/`
    pub default_effects: Option<String>,
}

impl GroupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload(mut self, upload: UploadOptions) -> Self {
        self.upload = upload;
        self
    }

    pub fn default_effects(mut self, effects: impl Into<String>) -> Self {
        self.default_effects = Some(effects.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID_A: &str = "b7a301d1-1bd0-473d-8d32-708dd55addc0";
    const UUID_B: &str = "a8d7f3c2-02ab-4ff1-9a13-2b1e8ad0c4f7";

    #[test]
    fn test_parse_items() {
        assert_eq!(GroupItem::parse(UUID_A).unwrap(), GroupItem::Uuid(UUID_A.to_string()));
        assert!(matches!(
            GroupItem::parse("https://example.com/cat.png").unwrap(),
            GroupItem::Url(_)
        ));
        assert!(GroupItem::parse("cat.png").is_err());
    }

    #[test]
    fn test_homogeneous_groups() {
        let source = GroupSource::from_strings(&[UUID_A, UUID_B]).unwrap();
        assert_eq!(
            source,
            GroupSource::Uuids(vec![UUID_A.to_string(), UUID_B.to_string()])
        );
        assert_eq!(source.len(), 2);

        let source = GroupSource::from_items(vec![
            FileData::new(vec![1]).into(),
            FileData::new(vec![2]).into(),
        ])
        .unwrap();
        assert!(matches!(source, GroupSource::Files(ref files) if files.len() == 2));
    }

    #[test]
    fn test_mixed_group_rejected() {
        let err = GroupSource::from_items(vec![
            GroupItem::Data(FileData::new(vec![1])),
            GroupItem::Url("https://example.com/cat.png".to_string()),
        ])
        .unwrap_err();
        assert!(matches!(err, UploadError::InvalidParameter { .. }));

        assert!(GroupSource::from_strings(&[UUID_A, "https://example.com/a.png"]).is_err());
    }

    #[test]
    fn test_empty_group_rejected() {
        assert!(GroupSource::from_items(Vec::new()).is_err());
        assert!(GroupSource::Urls(Vec::new()).validate().is_err());
        assert!(GroupSource::Uuids(vec!["nope".to_string()]).validate().is_err());
    }

    #[test]
    fn test_malformed_members_rejected() {
        let urls = GroupSource::Urls(vec![
            "https://example.com/a.png".to_string(),
            UUID_A.to_string(),
        ]);
        assert!(urls.validate().is_err());
        assert!(GroupSource::Urls(vec!["ftp://example.com/a".to_string()])
            .validate()
            .is_err());

        let files = GroupSource::Files(vec![FileData::new(vec![1]), FileData::new(Vec::new())]);
        assert!(files.validate().is_err());

        assert!(GroupSource::Urls(vec!["https://example.com/a.png".to_string()])
            .validate()
            .is_ok());
    }
}
