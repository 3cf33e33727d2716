/// Vendor configuration
///
/// Credentials, endpoints and timeouts for external services, loaded from
/// environment variables. Only `Option` fields may be absent; base URLs and
/// timeouts have defaults.

use std::env;
use std::time::Duration;

pub const DEFAULT_LUXAND_BASE_URL: &str = "https://api.luxand.cloud";
pub const DEFAULT_IMGBB_BASE_URL: &str = "https://api.imgbb.com";
pub const DEFAULT_PLATE_BASE_URL: &str = "https://api.platerecognizer.com/v1/plate-reader/";
pub const DEFAULT_STRIPE_BASE_URL: &str = "https://api.stripe.com";
pub const DEFAULT_FCM_BASE_URL: &str = "https://fcm.googleapis.com";
pub const DEFAULT_CLOUDINARY_BASE_URL: &str = "https://api.cloudinary.com";

#[derive(Debug, Clone)]
pub struct VendorConfig {
    pub luxand_token: Option<String>,
    pub luxand_base_url: String,
    /// Gallery residents are enrolled in and searched against
    pub luxand_collection: String,
    /// Gallery for employees (defaults to `luxand_collection`)
    pub luxand_collection_empleados: String,

    pub imgbb_api_key: Option<String>,
    pub imgbb_base_url: String,

    pub plate_token: Option<String>,
    pub plate_base_url: String,
    /// Comma-separated region hints sent with every scan
    pub plate_regions: String,

    pub stripe_secret_key: Option<String>,
    pub stripe_base_url: String,

    pub fcm_server_key: Option<String>,
    pub fcm_base_url: String,

    pub pdf_renderer_url: Option<String>,

    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    pub cloudinary_base_url: String,

    pub timeout: Duration,
    pub plate_timeout: Duration,
}

impl Default for VendorConfig {
    fn default() -> Self {
        VendorConfig {
            luxand_token: None,
            luxand_base_url: DEFAULT_LUXAND_BASE_URL.to_string(),
            luxand_collection: String::new(),
            luxand_collection_empleados: String::new(),
            imgbb_api_key: None,
            imgbb_base_url: DEFAULT_IMGBB_BASE_URL.to_string(),
            plate_token: None,
            plate_base_url: DEFAULT_PLATE_BASE_URL.to_string(),
            plate_regions: "bo".to_string(),
            stripe_secret_key: None,
            stripe_base_url: DEFAULT_STRIPE_BASE_URL.to_string(),
            fcm_server_key: None,
            fcm_base_url: DEFAULT_FCM_BASE_URL.to_string(),
            pdf_renderer_url: None,
            cloudinary_cloud_name: None,
            cloudinary_api_key: None,
            cloudinary_api_secret: None,
            cloudinary_base_url: DEFAULT_CLOUDINARY_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            plate_timeout: Duration::from_secs(20),
        }
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn secs(name: &str, default: u64) -> Result<Duration, String> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| format!("{} must be a valid number of seconds", name)),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

impl VendorConfig {
    /// Loads vendor settings from the environment
    pub fn from_env() -> Result<Self, String> {
        let defaults = VendorConfig::default();

        let luxand_collection = optional("LUXAND_COLLECTION").unwrap_or_default();
        let luxand_collection_empleados =
            optional("LUXAND_COLLECTION_EMPLEADOS").unwrap_or_else(|| luxand_collection.clone());

        Ok(VendorConfig {
            luxand_token: optional("LUXAND_TOKEN"),
            luxand_base_url: optional("LUXAND_BASE_URL").unwrap_or(defaults.luxand_base_url),
            luxand_collection,
            luxand_collection_empleados,
            imgbb_api_key: optional("IMGBB_API_KEY"),
            imgbb_base_url: optional("IMGBB_BASE_URL").unwrap_or(defaults.imgbb_base_url),
            plate_token: optional("PLATE_TOKEN"),
            plate_base_url: optional("PLATE_BASE_URL").unwrap_or(defaults.plate_base_url),
            plate_regions: optional("PLATE_REGIONS").unwrap_or(defaults.plate_regions),
            stripe_secret_key: optional("STRIPE_SECRET_KEY"),
            stripe_base_url: optional("STRIPE_BASE_URL").unwrap_or(defaults.stripe_base_url),
            fcm_server_key: optional("FCM_SERVER_KEY"),
            fcm_base_url: optional("FCM_BASE_URL").unwrap_or(defaults.fcm_base_url),
            pdf_renderer_url: optional("PDF_RENDERER_URL"),
            cloudinary_cloud_name: optional("CLOUDINARY_CLOUD_NAME"),
            cloudinary_api_key: optional("CLOUDINARY_API_KEY"),
            cloudinary_api_secret: optional("CLOUDINARY_API_SECRET"),
            cloudinary_base_url: optional("CLOUDINARY_BASE_URL")
                .unwrap_or(defaults.cloudinary_base_url),
            timeout: secs("VENDOR_TIMEOUT_SECS", 30)?,
            plate_timeout: secs("PLATE_TIMEOUT_SECS", 20)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VendorConfig::default();
        assert_eq!(config.luxand_base_url, "https://api.luxand.cloud");
        assert_eq!(config.plate_regions, "bo");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.plate_timeout, Duration::from_secs(20));
        assert!(config.luxand_token.is_none());
    }
}
