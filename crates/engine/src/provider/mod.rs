pub mod directory;
pub mod memory;

pub use directory::CsvDirectoryProvider;
pub use memory::MemoryProvider;
