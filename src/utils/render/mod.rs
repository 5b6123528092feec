pub mod border;

pub use crate::render::{CustomRenderElements, GlMultiFrame, GlMultiRenderer, MultiError};
