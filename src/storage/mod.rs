mod bindings;

pub use bindings::{BindingRecord, BindingStore};
