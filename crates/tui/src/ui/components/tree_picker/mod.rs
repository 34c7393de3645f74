mod tree_picker_component;

pub use tree_picker_component::TreePickerComponent;
