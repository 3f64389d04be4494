pub mod escape;
pub mod writer;

pub use escape::shell_escape;
pub use writer::{Binding, Value, Writer};
