use std::process;

use error::ScanError;

#[cfg(not(target_os = "linux"))]
std::compile_error!("linux is the only target os that was tested");

pub mod config;
pub mod error;
pub mod logger;
pub mod report;
pub mod resolver;
pub mod scan;
pub mod sweep;
pub mod user;

pub use user::is_user_sudo;

pub fn abort(error: ScanError) -> ! {
    eprintln!("Internal Error: {}", error);
    process::exit(1);
}
