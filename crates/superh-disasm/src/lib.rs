pub mod model;
pub mod sweep;

pub use model::{is_mapped, load_raw_bin, read_u8, read_window, Image, LoadError, Segment};
pub use sweep::{edges, sweep, EdgeOut, Line};
