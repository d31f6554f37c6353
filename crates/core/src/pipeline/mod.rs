pub mod infrastructure;
pub mod pipeline_logger;
pub mod transcribe_batch_use_case;
pub mod transcribe_pair_use_case;
