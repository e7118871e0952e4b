pub(crate) mod blur;
pub(crate) mod mask;
pub(crate) mod stack;
