mod dense;
mod init;
mod input;
mod layer;
mod merge;

pub use dense::Dense;
pub use init::Init;
pub use input::Input;
pub use layer::{Layer, LayerKind};
pub use merge::Merge;
