use framepump_common::{Color, Engine, LoadRejected, LogicalKey, Surface};

use crate::{
    FONTSET, FONTSET_SIZE, MAX_PROGRAM_SIZE, NUM_KEYS, NUM_REGS, RAM_SIZE, SCREEN_HEIGHT,
    SCREEN_WIDTH, STACK_SIZE, START_ADDRESS,
};

const ADDRESS_MASK: u16 = (RAM_SIZE - 1) as u16;

pub struct Emulator {
    /// program counter
    pc: u16,
    ram: [u8; RAM_SIZE],
    /// display
    screen: [bool; SCREEN_WIDTH * SCREEN_HEIGHT],
    /// V Registers
    v_reg: [u8; NUM_REGS],
    /// I Register
    i_reg: u16,
    stack_pointer: usize,
    stack: [u16; STACK_SIZE],
    keys: [bool; NUM_KEYS],
    delay_timer: u8,
    sound_timer: u8,
}

impl Default for Emulator {
    fn default() -> Self {
        let mut emu = Self {
            pc: START_ADDRESS,
            ram: [0; RAM_SIZE],
            screen: [false; SCREEN_WIDTH * SCREEN_HEIGHT],
            v_reg: [0; NUM_REGS],
            i_reg: 0,
            stack_pointer: 0,
            stack: [0; STACK_SIZE],
            keys: [false; NUM_KEYS],
            delay_timer: 0,
            sound_timer: 0,
        };
        emu.ram[..FONTSET_SIZE].copy_from_slice(&FONTSET);
        emu
    }
}

impl Emulator {
    pub fn display(&self) -> &[bool; SCREEN_WIDTH * SCREEN_HEIGHT] {
        &self.screen
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn v_reg(&self, x: usize) -> u8 {
        self.v_reg[x]
    }

    pub fn i_reg(&self) -> u16 {
        self.i_reg
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn is_key_pressed(&self, key: usize) -> bool {
        key < NUM_KEYS && self.keys[key]
    }

    #[inline]
    fn read(&self, addr: u16) -> u8 {
        self.ram[(addr & ADDRESS_MASK) as usize]
    }

    #[inline]
    fn write(&mut self, addr: u16, val: u8) {
        self.ram[(addr & ADDRESS_MASK) as usize] = val;
    }

    fn push(&mut self, val: u16) -> bool {
        if self.stack_pointer == STACK_SIZE {
            log::error!("Stack overflow at pc=0x{:03X}", self.pc);
            return false;
        }
        self.stack[self.stack_pointer] = val;
        self.stack_pointer += 1;
        true
    }

    fn pop(&mut self) -> Option<u16> {
        if self.stack_pointer == 0 {
            log::error!("Stack underflow at pc=0x{:03X}", self.pc);
            return None;
        }
        self.stack_pointer -= 1;
        Some(self.stack[self.stack_pointer])
    }

    fn fetch_opcode(&mut self) -> u16 {
        let hi = self.read(self.pc) as u16;
        let lo = self.read(self.pc.wrapping_add(1)) as u16;
        self.pc = self.pc.wrapping_add(2) & ADDRESS_MASK;
        hi << 8 | lo
    }

    fn skip_next(&mut self) {
        self.pc = self.pc.wrapping_add(2) & ADDRESS_MASK;
    }

    fn execute_opcode(&mut self, op: u16) {
        let digit1 = (op & 0xF000) >> 12;
        let digit2 = (op & 0x0F00) >> 8;
        let digit3 = (op & 0x00F0) >> 4;
        let digit4 = op & 0x000F;
        let nn = (op & 0x00FF) as u8;
        let nnn = op & 0x0FFF;
        match (digit1, digit2, digit3, digit4) {
            // NOP
            (0, 0, 0, 0) => (),
            // 00E0 - CLS
            (0, 0, 0xE, 0) => self.screen = [false; SCREEN_WIDTH * SCREEN_HEIGHT],
            // 00EE - RET
            (0, 0, 0xE, 0xE) => {
                if let Some(addr) = self.pop() {
                    self.pc = addr;
                }
            }
            // 0NNN - SYS addr, ignored by modern interpreters
            (0, _, _, _) => (),
            // 1NNN - JP addr
            (0x1, _, _, _) => self.pc = nnn,
            // 2NNN - CALL addr
            (0x2, _, _, _) => {
                if self.push(self.pc) {
                    self.pc = nnn;
                }
            }
            // 3XNN - SE Vx, NN
            (0x3, x, _, _) => {
                if self.v_reg[x as usize] == nn {
                    self.skip_next();
                }
            }
            // 4XNN - SNE Vx, NN
            (0x4, x, _, _) => {
                if self.v_reg[x as usize] != nn {
                    self.skip_next();
                }
            }
            // 5XY0 - SE Vx, Vy
            (0x5, x, y, 0) => {
                if self.v_reg[x as usize] == self.v_reg[y as usize] {
                    self.skip_next();
                }
            }
            // 6XNN - LD Vx, NN
            (0x6, x, _, _) => self.v_reg[x as usize] = nn,
            // 7XNN - ADD Vx, NN (no carry)
            (0x7, x, _, _) => self.v_reg[x as usize] = self.v_reg[x as usize].wrapping_add(nn),
            // 8XY0 - LD Vx, Vy
            (0x8, x, y, 0) => self.v_reg[x as usize] = self.v_reg[y as usize],
            // 8XY1 - OR
            (0x8, x, y, 1) => self.v_reg[x as usize] |= self.v_reg[y as usize],
            // 8XY2 - AND
            (0x8, x, y, 2) => self.v_reg[x as usize] &= self.v_reg[y as usize],
            // 8XY3 - XOR
            (0x8, x, y, 3) => self.v_reg[x as usize] ^= self.v_reg[y as usize],
            // 8XY4 - ADD Vx, Vy, VF = carry
            (0x8, x, y, 4) => {
                let (val, carry) = self.v_reg[x as usize].overflowing_add(self.v_reg[y as usize]);
                self.v_reg[x as usize] = val;
                self.v_reg[0xF] = carry as u8;
            }
            // 8XY5 - SUB Vx, Vy, VF = !borrow
            (0x8, x, y, 5) => {
                let (val, borrow) = self.v_reg[x as usize].overflowing_sub(self.v_reg[y as usize]);
                self.v_reg[x as usize] = val;
                self.v_reg[0xF] = !borrow as u8;
            }
            // 8XY6 - SHR Vx, VF = lsb
            (0x8, x, _, 6) => {
                let lsb = self.v_reg[x as usize] & 0x1;
                self.v_reg[x as usize] >>= 1;
                self.v_reg[0xF] = lsb;
            }
            // 8XY7 - SUBN Vx = Vy - Vx, VF = !borrow
            (0x8, x, y, 7) => {
                let (val, borrow) = self.v_reg[y as usize].overflowing_sub(self.v_reg[x as usize]);
                self.v_reg[x as usize] = val;
                self.v_reg[0xF] = !borrow as u8;
            }
            // 8XYE - SHL Vx, VF = msb
            (0x8, x, _, 0xE) => {
                let msb = (self.v_reg[x as usize] >> 7) & 0x1;
                self.v_reg[x as usize] <<= 1;
                self.v_reg[0xF] = msb;
            }
            // 9XY0 - SNE Vx, Vy
            (0x9, x, y, 0) => {
                if self.v_reg[x as usize] != self.v_reg[y as usize] {
                    self.skip_next();
                }
            }
            // ANNN - LD I, addr
            (0xA, _, _, _) => self.i_reg = nnn,
            // BNNN - JP V0 + addr
            (0xB, _, _, _) => self.pc = (nnn + self.v_reg[0] as u16) & ADDRESS_MASK,
            // CXNN - RND Vx = rand & NN
            (0xC, x, _, _) => self.v_reg[x as usize] = rand::random::<u8>() & nn,
            // DXYN - DRW Vx, Vy, N
            (0xD, x, y, height) => self.draw_sprite(x as usize, y as usize, height as usize),
            // EX9E - SKP Vx
            (0xE, x, 9, 0xE) => {
                if self.is_key_pressed(self.v_reg[x as usize] as usize) {
                    self.skip_next();
                }
            }
            // EXA1 - SKNP Vx
            (0xE, x, 0xA, 1) => {
                if !self.is_key_pressed(self.v_reg[x as usize] as usize) {
                    self.skip_next();
                }
            }
            // FX07 - LD Vx, DT
            (0xF, x, 0, 7) => self.v_reg[x as usize] = self.delay_timer,
            // FX0A - LD Vx, K: wait for a key
            (0xF, x, 0, 0xA) => match self.keys.iter().position(|pressed| *pressed) {
                Some(key) => self.v_reg[x as usize] = key as u8,
                // Re-run this instruction next step rather than blocking the host.
                None => self.pc = self.pc.wrapping_sub(2) & ADDRESS_MASK,
            },
            // FX15 - LD DT, Vx
            (0xF, x, 1, 5) => self.delay_timer = self.v_reg[x as usize],
            // FX18 - LD ST, Vx
            (0xF, x, 1, 8) => self.sound_timer = self.v_reg[x as usize],
            // FX1E - ADD I, Vx
            (0xF, x, 1, 0xE) => self.i_reg = self.i_reg.wrapping_add(self.v_reg[x as usize] as u16),
            // FX29 - LD F, Vx: 5 bytes per glyph
            (0xF, x, 2, 9) => self.i_reg = (self.v_reg[x as usize] & 0xF) as u16 * 5,
            // FX33 - LD B, Vx: BCD at I, I+1, I+2
            (0xF, x, 3, 3) => {
                let val = self.v_reg[x as usize];
                let i = self.i_reg;
                self.write(i, val / 100);
                self.write(i.wrapping_add(1), (val / 10) % 10);
                self.write(i.wrapping_add(2), val % 10);
            }
            // FX55 - LD [I], V0..=Vx
            (0xF, x, 5, 5) => {
                for offset in 0..=x {
                    self.write(self.i_reg.wrapping_add(offset), self.v_reg[offset as usize]);
                }
            }
            // FX65 - LD V0..=Vx, [I]
            (0xF, x, 6, 5) => {
                for offset in 0..=x {
                    self.v_reg[offset as usize] = self.read(self.i_reg.wrapping_add(offset));
                }
            }
            _ => log::error!(
                "Unknown opcode {:04X} at pc=0x{:03X}, skipping",
                op,
                self.pc.wrapping_sub(2)
            ),
        }
    }

    fn draw_sprite(&mut self, x: usize, y: usize, height: usize) {
        let x_coord = self.v_reg[x] as usize;
        let y_coord = self.v_reg[y] as usize;
        self.v_reg[0xF] = 0;
        for row in 0..height {
            let pixels = self.read(self.i_reg.wrapping_add(row as u16));
            for col in 0..8 {
                if (pixels >> (7 - col)) & 0x1 == 0 {
                    continue;
                }
                // Sprites wrap around the screen edges.
                let px = (x_coord + col) % SCREEN_WIDTH;
                let py = (y_coord + row) % SCREEN_HEIGHT;
                let pixel = &mut self.screen[px + py * SCREEN_WIDTH];
                if *pixel {
                    self.v_reg[0xF] = 1;
                }
                *pixel ^= true;
            }
        }
    }
}

impl Engine for Emulator {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn load(&mut self, image: Vec<u8>) -> Result<(), LoadRejected> {
        if image.is_empty() {
            return Err(LoadRejected::new("program image is empty"));
        }
        if image.len() > MAX_PROGRAM_SIZE {
            return Err(LoadRejected::new(format!(
                "program is {} bytes, at most {} fit in memory",
                image.len(),
                MAX_PROGRAM_SIZE
            )));
        }
        let start = START_ADDRESS as usize;
        self.ram[start..start + image.len()].copy_from_slice(&image);
        Ok(())
    }

    fn step(&mut self) {
        let opcode = self.fetch_opcode();
        self.execute_opcode(opcode);
    }

    fn decay_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        if self.sound_timer > 0 {
            if self.sound_timer == 1 {
                log::trace!("Beep");
            }
            self.sound_timer -= 1;
        }
    }

    fn render(&self, scale: u32, surface: &mut dyn Surface) {
        surface.clear(Color::BLACK);
        for (i, _) in self.screen.iter().enumerate().filter(|(_, lit)| **lit) {
            let x = (i % SCREEN_WIDTH) as u32;
            let y = (i / SCREEN_WIDTH) as u32;
            surface.fill_rect(x * scale, y * scale, scale, scale, Color::WHITE);
        }
    }

    fn key_transition(&mut self, key: LogicalKey, pressed: bool) {
        match self.keys.get_mut(key as usize) {
            Some(state) => *state = pressed,
            None => log::warn!("Ignoring out-of-range key index {}", key),
        }
    }

    fn width(&self) -> u32 {
        SCREEN_WIDTH as u32
    }

    fn height(&self) -> u32 {
        SCREEN_HEIGHT as u32
    }
}
