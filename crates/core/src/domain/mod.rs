mod log;
mod model;
mod session;
mod stream;

pub use log::*;
pub use model::*;
pub use session::*;
pub use stream::*;
