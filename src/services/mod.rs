pub mod pid_registry;
pub mod process_supervisor;
pub mod settings_engine;
pub mod snapshot_store;
