pub mod ai;
pub mod auth;
pub mod email;
pub mod kv;
pub mod minio;
pub mod pdfimg;
pub mod records;
