pub mod mailer;
pub mod stripe;

pub use mailer::*;
pub use stripe::*;
