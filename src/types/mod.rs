pub mod signature;
pub mod type_tag;

pub use signature::{parse_instance_type, parse_type_expr, InstanceTypes, TypeExpr};
pub use type_tag::{addresses_equal, normalize_address, TypeTag};
