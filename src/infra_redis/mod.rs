mod object_store_redis;

pub use object_store_redis::*;
