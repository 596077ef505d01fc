mod access_url_service;
mod upload_service;

pub use access_url_service::AccessUrlService;
pub use upload_service::UploadService;
