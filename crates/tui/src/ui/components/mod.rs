pub mod common;
pub mod component;
pub mod tree_picker;

pub use tree_picker::TreePickerComponent;
