pub mod histogram;
pub mod tables;
pub mod theme;
