pub mod assemble;
pub mod consts;
pub mod error;
pub mod frame;
pub mod io;
pub mod merge;
pub mod pipeline;
pub mod render;
