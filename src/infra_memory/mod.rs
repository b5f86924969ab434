mod object_store_memory;

pub use object_store_memory::*;
