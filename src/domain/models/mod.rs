mod credential;
mod error;
mod image;
mod provider;
mod store;

pub use credential::*;
pub use error::*;
pub use image::*;
pub use provider::*;
pub use store::*;
