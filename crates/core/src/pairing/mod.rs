pub mod pair;
pub mod pairing_resolver;
