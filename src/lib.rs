pub mod block;
pub mod cache;
pub mod conf;
pub mod core;
pub mod io;
pub mod marks;
pub mod reader;

#[cfg(feature = "testutil")]
pub mod testutil;
