mod access;
mod cursor;
mod key;
mod message;
mod unit;

pub use access::*;
pub use cursor::*;
pub use key::*;
pub use message::*;
pub use unit::*;
