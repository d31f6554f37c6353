pub mod eaf_store;
