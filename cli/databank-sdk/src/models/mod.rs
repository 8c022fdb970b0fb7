pub mod list_manager;
pub mod list_state;
