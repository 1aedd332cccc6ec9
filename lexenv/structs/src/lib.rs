pub mod error;
pub mod frame;
pub mod macros;
pub mod number;
pub mod value;
