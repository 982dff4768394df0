pub mod attendance;
pub mod class_session;
pub mod credentials;
pub mod lecturer;
pub mod login_session;
pub mod sqlite_repository;
pub mod student;
