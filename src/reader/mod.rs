pub(crate) mod resolver;
mod stream;

pub use stream::{DataBuffer, ReaderStream};
