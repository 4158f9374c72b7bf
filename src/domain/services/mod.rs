mod app_state;
mod credentials;
mod generation;
mod key_store;

pub use app_state::*;
pub use credentials::*;
pub use generation::*;
pub use key_store::*;
