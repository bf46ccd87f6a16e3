mod attach;
mod config;
mod driver;
mod encoder;
mod endpoint;
mod error;
mod position;

pub use attach::*;
pub use config::*;
pub use driver::*;
pub use encoder::*;
pub use endpoint::*;
pub use error::*;
pub use position::*;
