pub mod api;
pub mod core;
pub mod csv_io;
