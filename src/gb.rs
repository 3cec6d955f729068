//! Top-level frame driver tying the CPU, memory unit, and graphics unit together.

use crate::cpu::Cpu;
use crate::memory_unit::MemoryUnit;
use crate::ppu::FRAME_BUFFER_SIZE;

/// T-cycles in one 59.7 Hz DMG frame (70224 dots / 4 = 59.7 Hz at 4.194304 MHz).
const CYCLES_PER_FRAME: u32 = 69905;

/// Owns a [`Cpu`] and a [`MemoryUnit`] and drives them together one frame at a time.
pub struct GameBoy {
    cpu: Cpu,
    memory: MemoryUnit,
}

impl GameBoy {
    pub fn new() -> Self {
        GameBoy {
            cpu: Cpu::new(),
            memory: MemoryUnit::new(),
        }
    }

    /// Resets the CPU and memory/graphics state to their documented defaults.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.memory.graphics_unit_mut().reset();
    }

    /// Loads a ROM image. See [`MemoryUnit::load_rom`] for the truncation contract.
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<bool, String> {
        self.memory.load_rom(bytes)
    }

    /// Executes a single CPU instruction, returning the T-cycles it consumed.
    pub fn step(&mut self) -> u16 {
        self.cpu.step(&mut self.memory)
    }

    /// Runs one frame's worth of CPU cycles, then composes the frame into the
    /// framebuffer.
    pub fn run_frame(&mut self) {
        self.cpu.run_cycles(CYCLES_PER_FRAME, &mut self.memory);
        self.memory.graphics_unit_mut().render_frame();
    }

    /// The most recently composed frame, RGB row-major, 160x144x3 bytes.
    pub fn framebuffer(&self) -> &[u8; FRAME_BUFFER_SIZE] {
        self.memory.graphics_unit().framebuffer()
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }
    pub fn memory(&self) -> &MemoryUnit {
        &self.memory
    }
    pub fn memory_mut(&mut self) -> &mut MemoryUnit {
        &mut self.memory
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_gameboy_starts_with_documented_defaults() {
        let gb = GameBoy::new();
        assert_eq!(gb.cpu().pc(), 0x0100);
        assert_eq!(gb.cpu().sp(), 0xFFFE);
    }

    #[test]
    fn load_rom_reports_truncation() {
        let mut gb = GameBoy::new();
        let small = vec![0xAA; 100];
        assert_eq!(gb.load_rom(&small), Ok(false));

        let large = vec![0x11; 0x8000 + 10];
        assert_eq!(gb.load_rom(&large), Ok(true));

        assert!(gb.load_rom(&[]).is_err());
    }

    #[test]
    fn run_frame_advances_total_cycles_by_at_least_one_frame() {
        let mut gb = GameBoy::new();
        gb.run_frame();
        assert!(gb.cpu().total_cycles() >= CYCLES_PER_FRAME as u64);
    }
}
