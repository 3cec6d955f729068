use crate::memory_map::*;
use crate::ppu::GraphicsUnit;
use std::fmt;

const ROM_SIZE: usize = 0x8000; // fixed 32 KiB, no bank switching
const WRAM_SIZE: usize = (WRAM_BANK_N_END - WRAM_BANK_0_START + 1) as usize; // 8 KiB, 0xC000-0xDFFF

/// Routes 8/16-bit reads and writes across the Game Boy's 16-bit address
/// space, forwarding VRAM/OAM/LCD-register traffic to a [`GraphicsUnit`].
///
/// This is the fixed-32-KiB-ROM, no-MBC, no-joypad variant of the region
/// routing the teacher's `MemoryBus` implements: bank switching, external
/// RAM, and input handling are out of scope here.
pub struct MemoryUnit {
    rom: Box<[u8; ROM_SIZE]>,
    wram: Box<[u8; WRAM_SIZE]>,
    hram: Box<[u8; HRAM_SIZE]>,
    io_shadow: Box<[u8; IO_REGISTERS_SIZE]>,
    interrupt_enable: u8, // 0xFFFF (IE register)

    rom_loaded: bool,
    rom_load_generation: u32,

    gu: GraphicsUnit,
}

impl MemoryUnit {
    pub fn new() -> Self {
        MemoryUnit {
            rom: Box::new([0; ROM_SIZE]),
            wram: Box::new([0; WRAM_SIZE]),
            hram: Box::new([0; HRAM_SIZE]),
            io_shadow: Box::new([0; IO_REGISTERS_SIZE]),
            interrupt_enable: 0,
            rom_loaded: false,
            rom_load_generation: 0,
            gu: GraphicsUnit::new(),
        }
    }

    /// Copies the first `min(bytes.len(), 32768)` bytes into ROM storage and
    /// zero-fills the remainder. Returns `Ok(true)` if the input was
    /// truncated, `Ok(false)` if it fit, `Err` only for empty input.
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<bool, String> {
        if bytes.is_empty() {
            return Err("ROM load failed: input is empty".to_string());
        }

        let copy_len = bytes.len().min(ROM_SIZE);
        self.rom[..copy_len].copy_from_slice(&bytes[..copy_len]);
        self.rom[copy_len..].fill(0);

        self.rom_loaded = true;
        self.rom_load_generation += 1;

        let truncated = bytes.len() > ROM_SIZE;
        log::info!(
            "Loaded ROM: {} bytes copied{}, generation {}",
            copy_len,
            if truncated { " (input truncated to 32 KiB)" } else { "" },
            self.rom_load_generation
        );
        Ok(truncated)
    }

    pub fn is_rom_loaded(&self) -> bool {
        self.rom_loaded
    }
    pub fn rom_load_generation(&self) -> u32 {
        self.rom_load_generation
    }

    pub fn graphics_unit(&self) -> &GraphicsUnit {
        &self.gu
    }
    pub fn graphics_unit_mut(&mut self) -> &mut GraphicsUnit {
        &mut self.gu
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            ROM_BANK_0_START..=ROM_BANK_N_END => self.rom[addr as usize],
            VRAM_START..=VRAM_END => self.gu.read_vram(addr - VRAM_START),
            EXT_RAM_START..=EXT_RAM_END => 0,
            WRAM_BANK_0_START..=WRAM_BANK_N_END => self.wram[(addr - WRAM_BANK_0_START) as usize],
            ECHO_RAM_START..=ECHO_RAM_END => 0,
            OAM_START..=OAM_END => self.gu.read_oam(addr - OAM_START),
            NOT_USABLE_START..=NOT_USABLE_END => 0,
            IO_REGISTERS_START..=IO_REGISTERS_END => match addr {
                LCDC_ADDR => self.gu.lcdc(),
                _ => self.io_shadow[(addr - IO_REGISTERS_START) as usize],
            },
            HRAM_START..=HRAM_END => self.hram[(addr - HRAM_START) as usize],
            INTERRUPT_ENABLE_REGISTER => self.interrupt_enable,
        }
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) {
        match addr {
            ROM_BANK_0_START..=ROM_BANK_N_END => {}
            VRAM_START..=VRAM_END => self.gu.write_vram(addr - VRAM_START, value),
            EXT_RAM_START..=EXT_RAM_END => {}
            WRAM_BANK_0_START..=WRAM_BANK_N_END => {
                self.wram[(addr - WRAM_BANK_0_START) as usize] = value
            }
            ECHO_RAM_START..=ECHO_RAM_END => {}
            OAM_START..=OAM_END => self.gu.write_oam(addr - OAM_START, value),
            NOT_USABLE_START..=NOT_USABLE_END => {}
            IO_REGISTERS_START..=IO_REGISTERS_END => {
                self.io_shadow[(addr - IO_REGISTERS_START) as usize] = value;
                match addr {
                    LCDC_ADDR => self.gu.set_lcdc(value),
                    SCY_ADDR => self.gu.set_scy(value),
                    SCX_ADDR => self.gu.set_scx(value),
                    BGP_ADDR => self.gu.set_bgp(value),
                    OBP0_ADDR => self.gu.set_obp0(value),
                    OBP1_ADDR => self.gu.set_obp1(value),
                    WY_ADDR => self.gu.set_wy(value),
                    WX_ADDR => self.gu.set_wx(value),
                    _ => {}
                }
            }
            HRAM_START..=HRAM_END => self.hram[(addr - HRAM_START) as usize] = value,
            INTERRUPT_ENABLE_REGISTER => self.interrupt_enable = value,
        }
    }

    /// Reads a 16-bit word (little-endian).
    pub fn read_word(&self, addr: u16) -> u16 {
        let low = self.read_byte(addr) as u16;
        let high = self.read_byte(addr.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    /// Writes a 16-bit word (little-endian).
    pub fn write_word(&mut self, addr: u16, value: u16) {
        let low = (value & 0xFF) as u8;
        let high = (value >> 8) as u8;
        self.write_byte(addr, low);
        self.write_byte(addr.wrapping_add(1), high);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rom_writes_are_ignored() {
        let mut mu = MemoryUnit::new();
        mu.load_rom(&[0xAA; 10]).unwrap();
        mu.write_byte(0x0000, 0x42);
        assert_eq!(mu.read_byte(0x0000), 0xAA);
    }

    #[test]
    fn echo_ram_and_not_usable_regions_are_unmapped() {
        let mut mu = MemoryUnit::new();
        mu.write_byte(ECHO_RAM_START, 0x55);
        mu.write_byte(NOT_USABLE_START, 0x55);
        assert_eq!(mu.read_byte(ECHO_RAM_START), 0);
        assert_eq!(mu.read_byte(NOT_USABLE_START), 0);
    }

    #[test]
    fn wram_round_trips_independently_of_vram() {
        let mut mu = MemoryUnit::new();
        mu.write_byte(WRAM_BANK_0_START, 0x12);
        mu.write_byte(VRAM_START, 0x34);
        assert_eq!(mu.read_byte(WRAM_BANK_0_START), 0x12);
        assert_eq!(mu.read_byte(VRAM_START), 0x34);
    }

    #[test]
    fn lcdc_write_updates_both_shadow_and_graphics_unit() {
        let mut mu = MemoryUnit::new();
        mu.write_byte(LCDC_ADDR, 0x00);
        assert_eq!(mu.read_byte(LCDC_ADDR), 0x00);
        assert_eq!(mu.graphics_unit().lcdc(), 0x00);
    }

    #[test]
    fn non_lcdc_io_write_only_touches_the_shadow() {
        let mut mu = MemoryUnit::new();
        mu.write_byte(SB_ADDR, 0x7E);
        assert_eq!(mu.read_byte(SB_ADDR), 0x7E);
    }

    #[test]
    fn load_rom_rejects_empty_input() {
        let mut mu = MemoryUnit::new();
        assert!(mu.load_rom(&[]).is_err());
    }

    #[test]
    fn read_write_word_round_trips_little_endian() {
        let mut mu = MemoryUnit::new();
        mu.write_word(HRAM_START, 0xBEEF);
        assert_eq!(mu.read_word(HRAM_START), 0xBEEF);
        assert_eq!(mu.read_byte(HRAM_START), 0xEF);
        assert_eq!(mu.read_byte(HRAM_START.wrapping_add(1)), 0xBE);
    }
}

impl fmt::Debug for MemoryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryUnit")
            .field("rom_loaded", &self.rom_loaded)
            .field("rom_load_generation", &self.rom_load_generation)
            .field("IE", &format_args!("{:#04X}", self.interrupt_enable))
            .finish_non_exhaustive()
    }
}
