mod nominal_virtual_node;
mod numeric_virtual_node;
mod virtual_node;

pub use nominal_virtual_node::NominalVirtualNode;
pub use numeric_virtual_node::NumericVirtualNode;
pub use virtual_node::VirtualNode;
