pub mod args;
pub mod db;
pub mod error;
pub mod handle;
pub mod model;
pub mod sink;
pub mod util;
