use std::time::Duration;

/// Connection settings for a Cloudinary-style media store
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    /// API root, e.g. `https://api.cloudinary.com`
    pub base_url: String,

    /// Account identifier used in every path (`/v1_1/{cloud_name}/...`)
    pub cloud_name: String,

    /// Unsigned upload preset sent with every upload
    pub upload_preset: String,

    /// Only needed for signed calls (destroy)
    pub api_key: Option<String>,
    pub api_secret: Option<String>,

    /// Resource type used for destroy calls
    pub resource_type: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl CloudinaryConfig {
    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.cloudinary.com".to_string(),
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
            api_key: None,
            api_secret: None,
            resource_type: "image".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn credentials(mut self, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self.api_secret = Some(api_secret.into());
        self
    }

    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = resource_type.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/upload", self.base_url, self.cloud_name)
    }

    pub(crate) fn destroy_url(&self) -> String {
        format!("{}/v1_1/{}/{}/destroy", self.base_url, self.cloud_name, self.resource_type)
    }
}
