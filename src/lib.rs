pub mod cpu;
pub mod font;
pub mod instruction;
pub mod nibbles;
pub mod screen;

pub use cpu::{ControlEvent, Cpu, CpuError, CpuEvent};
pub use screen::Screen;
