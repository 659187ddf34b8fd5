pub mod anim;
pub mod apps;
pub mod gesture;
pub mod gui;
pub mod logging;
pub mod settings;
pub mod shade;
pub mod system;
