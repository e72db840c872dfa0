pub mod candidate;
pub mod message;
pub mod question;
pub mod session;
