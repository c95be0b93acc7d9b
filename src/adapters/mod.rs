pub mod csv_log;
pub mod speedtest_cli;
