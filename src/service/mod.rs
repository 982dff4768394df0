pub mod attendance;
pub mod qr;
pub mod report;
