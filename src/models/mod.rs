pub mod attendance;
pub mod class_session;
pub mod health;
pub mod lecturer;
pub mod login_session;
pub mod student;
