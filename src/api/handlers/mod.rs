pub mod caller;

pub mod health;
pub use self::health::health;

pub mod password_reset;
pub use self::password_reset::{admin_password_reset, password_reset};
