pub(crate) mod adaptive;
pub(crate) mod ffmpeg;
pub(crate) mod probe;
pub(crate) mod sink;
