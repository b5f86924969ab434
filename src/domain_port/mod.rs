mod authorizer;
mod clock;
mod object_store;

pub use authorizer::*;
pub use clock::*;
pub use object_store::*;
