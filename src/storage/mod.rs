/// Object stores for progress and finished videos.
pub mod blob;
/// S3 bucket store.
pub mod s3;
