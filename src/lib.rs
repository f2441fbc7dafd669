pub mod callback;
pub mod logging;
pub mod defaultlogger;
pub mod utils;

pub mod mercator;
pub mod mapblocks;
pub mod extract;
