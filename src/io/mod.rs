mod disk;
mod file;

pub use disk::{Disk, LocalDisk};
pub use file::{FileReader, ProfileCallback, ReadProfile};
