pub mod components;
pub mod highlight;
pub mod layout;
pub mod line_input;
pub mod theme;
