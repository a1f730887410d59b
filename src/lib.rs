pub mod analyzers;
pub mod chart;
pub mod config;
pub mod driver;
pub mod output;
pub mod parser;
