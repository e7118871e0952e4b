pub(crate) mod layout;
pub(crate) mod renderer;
