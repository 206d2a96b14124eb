mod config;
mod constants;
mod outcome;
mod report;
mod request;
mod status;

pub use config::*;
pub use constants::*;
pub use outcome::*;
pub use report::*;
pub use request::*;
pub use status::*;
