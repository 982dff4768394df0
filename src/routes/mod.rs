pub mod api;
pub mod attendance;
pub mod class_session;
pub mod cron;
pub mod error;
pub mod health;
pub mod home;
pub mod lecturer;
pub mod report;
pub mod student;
