mod resolver;

pub use resolver::{resolve, ResolvedObject};
