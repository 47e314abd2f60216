pub mod persistence;
pub mod store;
pub mod table;

pub use persistence::{IdSequence, atomic_write};
pub use store::{IdPolicy, RecordStore};
pub use table::{RecordTable, load_population, load_records, read_records, save_records, write_csv};
