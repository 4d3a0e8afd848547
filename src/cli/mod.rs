pub mod download;
pub mod generate;
pub mod serve;
pub mod setup;
pub mod ui;
