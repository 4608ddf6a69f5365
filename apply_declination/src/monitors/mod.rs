pub mod statistics_monitor;
