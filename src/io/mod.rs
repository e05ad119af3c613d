mod obj;
pub use obj::{export_obj, write_mtl, write_obj};
