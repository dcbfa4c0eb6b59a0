//! Object storage wrapper (S3 and compatible stores).

pub mod builders;
pub mod client;

pub use builders::{Download, ObjectExists, RemoveObject, Sign, SignMethod, Upload};
pub use client::{DownloadedObject, S3Client, UploadResult};
