use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// The managed entity types. Each has its own field set but shares the
/// list/edit lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Category,
    Notification,
    Slider,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Category,
        ResourceKind::Notification,
        ResourceKind::Slider,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Category => "category",
            ResourceKind::Notification => "notification",
            ResourceKind::Slider => "slider",
        }
    }

    /// Key wrapping both the collection and the single record in responses.
    pub fn envelope_key(&self) -> &'static str {
        self.as_str()
    }

    /// Multipart field name carrying a newly selected image.
    pub fn image_field(&self) -> &'static str {
        match self {
            ResourceKind::Category => "categories_images",
            ResourceKind::Notification => "notification_image",
            ResourceKind::Slider => "slider_images",
        }
    }

    /// The identity-like field that a per-kind policy may lock.
    pub fn name_field(&self) -> &'static str {
        match self {
            ResourceKind::Category => "category_name",
            ResourceKind::Notification => "notification_heading",
            ResourceKind::Slider => "slider_url",
        }
    }

    pub fn route_base(&self) -> &'static str {
        match self {
            ResourceKind::Category => "/master/category",
            ResourceKind::Notification => "/notification",
            ResourceKind::Slider => "/app-update/slider",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown resource kind '{0}' (expected category, notification or slider)")]
pub struct UnknownKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category" | "categories" => Ok(ResourceKind::Category),
            "notification" | "notifications" => Ok(ResourceKind::Notification),
            "slider" | "sliders" => Ok(ResourceKind::Slider),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// Positive numeric primary key issued by the remote catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ResourceId(NonZeroU64);

impl ResourceId {
    /// Returns `None` for zero, which the catalog never issues.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Record status. Only `Active` and `Inactive` can be set from the form;
/// anything else the server sends is kept as-is so one odd row does not
/// sink a whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Option<String>")]
pub enum Status {
    Active,
    Inactive,
    #[default]
    Unset,
    Other(String),
}

impl From<Option<String>> for Status {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref().map(str::trim) {
            None | Some("") => Status::Unset,
            Some(value) => {
                Status::parse(value).unwrap_or_else(|| Status::Other(value.to_string()))
            }
        }
    }
}

impl Serialize for Status {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Active => "Active",
            Status::Inactive => "Inactive",
            Status::Unset => "",
            Status::Other(raw) => raw,
        }
    }

    /// Form-side parse: only the two settable values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(Status::Active),
            "Inactive" => Some(Status::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("unknown field '{0}'")]
    Unknown(String),
    #[error("field '{0}' is read-only")]
    ReadOnly(&'static str),
    #[error("invalid status '{0}' (expected Active or Inactive)")]
    InvalidStatus(String),
    #[error("the form is not editable right now")]
    NotReady,
}

/// A remote record the console can list and edit.
pub trait Resource:
    Clone + fmt::Debug + PartialEq + Serialize + serde::de::DeserializeOwned + Send + Sync + 'static
{
    const KIND: ResourceKind;

    /// Identity as reported by the server, when present in the payload.
    fn id(&self) -> Option<ResourceId>;

    /// Stored image file name; empty strings count as absent.
    fn image(&self) -> Option<&str>;

    /// Every editable scalar field in submission order. The image is not
    /// included; it only travels as a file part.
    fn text_fields(&self) -> Vec<(&'static str, String)>;

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), FieldError>;
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// `null` reads as an empty string.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn parse_status(value: &str) -> Result<Status, FieldError> {
    Status::parse(value).ok_or_else(|| FieldError::InvalidStatus(value.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_name: String,
    #[serde(default)]
    pub category_status: Status,
    #[serde(default)]
    pub categories_images: Option<String>,
}

impl Resource for Category {
    const KIND: ResourceKind = ResourceKind::Category;

    fn id(&self) -> Option<ResourceId> {
        self.id
    }

    fn image(&self) -> Option<&str> {
        non_empty(&self.categories_images)
    }

    fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("category_name", self.category_name.clone()),
            ("category_status", self.category_status.as_str().to_string()),
        ]
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), FieldError> {
        match field {
            "category_name" => self.category_name = value.to_string(),
            "category_status" => self.category_status = parse_status(value)?,
            other => return Err(FieldError::Unknown(other.to_string())),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notification_heading: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notification_description: String,
    #[serde(default)]
    pub notification_status: Status,
    #[serde(default)]
    pub notification_image: Option<String>,
}

impl Resource for Notification {
    const KIND: ResourceKind = ResourceKind::Notification;

    fn id(&self) -> Option<ResourceId> {
        self.id
    }

    fn image(&self) -> Option<&str> {
        non_empty(&self.notification_image)
    }

    fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("notification_heading", self.notification_heading.clone()),
            (
                "notification_description",
                self.notification_description.clone(),
            ),
            (
                "notification_status",
                self.notification_status.as_str().to_string(),
            ),
        ]
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), FieldError> {
        match field {
            "notification_heading" => self.notification_heading = value.to_string(),
            "notification_description" => self.notification_description = value.to_string(),
            "notification_status" => self.notification_status = parse_status(value)?,
            other => return Err(FieldError::Unknown(other.to_string())),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub slider_url: String,
    #[serde(default)]
    pub slider_status: Status,
    #[serde(default)]
    pub slider_images: Option<String>,
}

impl Resource for Slider {
    const KIND: ResourceKind = ResourceKind::Slider;

    fn id(&self) -> Option<ResourceId> {
        self.id
    }

    fn image(&self) -> Option<&str> {
        non_empty(&self.slider_images)
    }

    fn text_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("slider_url", self.slider_url.clone()),
            ("slider_status", self.slider_status.as_str().to_string()),
        ]
    }

    fn set_field(&mut self, field: &str, value: &str) -> Result<(), FieldError> {
        match field {
            "slider_url" => self.slider_url = value.to_string(),
            "slider_status" => self.slider_status = parse_status(value)?,
            other => return Err(FieldError::Unknown(other.to_string())),
        }
        Ok(())
    }
}

/// A file chosen for upload with the next submission.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for PendingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl PendingFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(Path::new(&file_name)).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub async fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::{anyhow, Context};

        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("invalid file name"))?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        Ok(Self::new(file_name, bytes))
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_ascii_lowercase())
    {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
