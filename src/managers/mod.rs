pub mod session_controller;
pub mod tab_manager;
