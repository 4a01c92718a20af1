pub mod buffer;
pub mod navigation;
pub mod practice;
pub mod typing;
