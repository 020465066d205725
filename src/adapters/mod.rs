pub mod csv_bar_adapter;
pub mod csv_sink_adapter;
pub mod file_config_adapter;
pub mod polling_feed;
