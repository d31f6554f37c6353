pub mod compute_device;
pub mod constants;
pub mod model_resolver;
