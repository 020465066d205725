pub mod bar_port;
pub mod config_port;
pub mod sink_port;
