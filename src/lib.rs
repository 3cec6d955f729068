//! A cycle-accurate Sharp LR35902 (DMG) core: CPU interpreter, memory routing,
//! and background/window/sprite graphics composition.
//!
//! Host concerns - windowing, audio, serial, RTC, and cartridge bank
//! switching beyond a fixed 32 KiB ROM - live outside this crate.

pub mod cpu;
pub mod gb;
pub mod memory_map;
pub mod memory_unit;
pub mod ppu;

pub use cpu::Cpu;
pub use gb::GameBoy;
pub use memory_unit::MemoryUnit;
pub use ppu::GraphicsUnit;
