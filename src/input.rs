//! Collaborator contracts consumed by the render core, plus small reference implementations.

pub(crate) mod audio;
pub(crate) mod background;
pub(crate) mod glyph;
pub(crate) mod lyrics;
