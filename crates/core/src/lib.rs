pub mod annotation;
pub mod audio;
pub mod pairing;
pub mod pipeline;
pub mod shared;
