pub(crate) mod background;
pub(crate) mod blend;
pub(crate) mod compositor;
pub(crate) mod frame;
pub(crate) mod motion;
pub(crate) mod pool;
pub(crate) mod reactive;
