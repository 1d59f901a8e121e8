pub mod error;
pub mod firebase;
pub mod pipeline;
pub mod store;

pub use error::ImageError;
pub use firebase::FirebaseStore;
pub use pipeline::{ProfileImage, ProfileImagePipeline, profile_image_key};
pub use store::{FsObjectStore, ObjectStore};
