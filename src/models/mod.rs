pub mod linear;
pub mod snd;
pub mod utils;

pub use snd::SndModel;
