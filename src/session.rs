pub(crate) mod config;
pub(crate) mod frame_loop;
pub(crate) mod render_session;
