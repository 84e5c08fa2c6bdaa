pub mod build;
pub mod enhance;
pub mod init;
