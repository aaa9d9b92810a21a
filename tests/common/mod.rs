//! Test-only Hack assembler and CPU, used to execute generated assembly.
#![allow(dead_code)]

use std::collections::HashMap;

use vmil::{translate_units, TranslatorConfig, Unit};

pub const HALT: u16 = 0xFFFF;

fn comp_bits(comp: &str) -> Option<u16> {
    let bits = match comp {
        "0" => 0b0101010,
        "1" => 0b0111111,
        "-1" => 0b0111010,
        "D" => 0b0001100,
        "A" => 0b0110000,
        "!D" => 0b0001101,
        "!A" => 0b0110001,
        "-D" => 0b0001111,
        "-A" => 0b0110011,
        "D+1" => 0b0011111,
        "A+1" => 0b0110111,
        "D-1" => 0b0001110,
        "A-1" => 0b0110010,
        "D+A" => 0b0000010,
        "D-A" => 0b0010011,
        "A-D" => 0b0000111,
        "D&A" => 0b0000000,
        "D|A" => 0b0010101,
        "M" => 0b1110000,
        "!M" => 0b1110001,
        "-M" => 0b1110011,
        "M+1" => 0b1110111,
        "M-1" => 0b1110010,
        "D+M" => 0b1000010,
        "D-M" => 0b1010011,
        "M-D" => 0b1000111,
        "D&M" => 0b1000000,
        "D|M" => 0b1010101,
        _ => return None,
    };
    Some(bits)
}

fn dest_bits(dest: &str) -> Option<u16> {
    let mut bits = 0;
    for c in dest.chars() {
        bits |= match c {
            'A' => 0b100,
            'D' => 0b010,
            'M' => 0b001,
            _ => return None,
        };
    }
    Some(bits)
}

fn jump_bits(jump: &str) -> Option<u16> {
    let bits = match jump {
        "" => 0b000,
        "JGT" => 0b001,
        "JEQ" => 0b010,
        "JGE" => 0b011,
        "JLT" => 0b100,
        "JNE" => 0b101,
        "JLE" => 0b110,
        "JMP" => 0b111,
        _ => return None,
    };
    Some(bits)
}

fn predefined() -> HashMap<String, u16> {
    let mut symbols: HashMap<String, u16> = (0..16).map(|i| (format!("R{}", i), i)).collect();
    for (name, addr) in [
        ("SP", 0),
        ("LCL", 1),
        ("ARG", 2),
        ("THIS", 3),
        ("THAT", 4),
        ("SCREEN", 0x4000),
        ("KBD", 0x6000),
    ] {
        symbols.insert(name.to_string(), addr);
    }
    symbols
}

#[derive(Debug)]
pub struct Program {
    pub code: Vec<u16>,
    pub symbols: HashMap<String, u16>,
}

/// Two passes: labels first, then variables from address 16 while emitting.
pub fn assemble(source: &str) -> Result<Program, String> {
    let lines: Vec<(usize, &str)> = source
        .lines()
        .enumerate()
        .map(|(i, line)| {
            let line = line.split_once("//").map(|(s, _)| s).unwrap_or(line);
            (i + 1, line.trim())
        })
        .filter(|(_, line)| !line.is_empty())
        .collect();

    let mut symbols = predefined();
    let mut pc = 0u16;
    for &(line_no, line) in &lines {
        if let Some(label) = line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
            if symbols.insert(label.to_string(), pc).is_some() {
                return Err(format!("line {}: duplicate symbol {}", line_no, label));
            }
        } else {
            pc += 1;
        }
    }

    let mut next_var = 16;
    let mut code = Vec::new();
    for &(line_no, line) in &lines {
        if line.starts_with('(') {
            continue;
        }
        if let Some(value) = line.strip_prefix('@') {
            let word = match value.parse::<u16>() {
                Ok(n) if n <= 0x7FFF => n,
                Ok(_) => return Err(format!("line {}: constant too large: {}", line_no, line)),
                Err(_) => *symbols.entry(value.to_string()).or_insert_with(|| {
                    next_var += 1;
                    next_var - 1
                }),
            };
            code.push(word);
            continue;
        }

        let (dest, rest) = line.split_once('=').unwrap_or(("", line));
        let (comp, jump) = rest.split_once(';').unwrap_or((rest, ""));
        let invalid = || format!("line {}: invalid instruction {}", line_no, line);
        let comp = comp_bits(comp.trim()).ok_or_else(invalid)?;
        let dest = dest_bits(dest.trim()).ok_or_else(invalid)?;
        let jump = jump_bits(jump.trim()).ok_or_else(invalid)?;
        code.push(0b111 << 13 | comp << 6 | dest << 3 | jump);
    }

    Ok(Program { code, symbols })
}

/// The Hack ALU, driven by the six control bits zx nx zy ny f no.
fn alu(control: u16, x: u16, y: u16) -> u16 {
    let bit = |n: u16| control & (1 << n) != 0;
    let mut x = if bit(5) { 0 } else { x };
    if bit(4) {
        x = !x;
    }
    let mut y = if bit(3) { 0 } else { y };
    if bit(2) {
        y = !y;
    }
    let out = if bit(1) { x.wrapping_add(y) } else { x & y };
    if bit(0) {
        !out
    } else {
        out
    }
}

fn should_jump(jump: u16, out: u16) -> bool {
    let out = out as i16;
    (jump & 0b100 != 0 && out < 0) || (jump & 0b010 != 0 && out == 0) || (jump & 0b001 != 0 && out > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    Halted,
    /// PC left the program.
    Finished,
    Reached,
    OutOfCycles,
}

pub struct Cpu {
    pub a: u16,
    pub d: u16,
    pub pc: u16,
    pub ram: Vec<u16>,
    rom: Vec<u16>,
    pub cycles: usize,
}

impl Cpu {
    pub fn new(rom: Vec<u16>) -> Self {
        Cpu {
            a: 0,
            d: 0,
            pc: 0,
            ram: vec![0; 0x10000],
            rom,
            cycles: 0,
        }
    }

    /// Execute one instruction, or report why execution stopped.
    fn step(&mut self) -> Option<Stop> {
        let Some(&instruction) = self.rom.get(usize::from(self.pc)) else {
            return Some(Stop::Finished);
        };
        if instruction == HALT {
            return Some(Stop::Halted);
        }
        self.cycles += 1;

        if instruction & 0x8000 == 0 {
            self.a = instruction;
            self.pc += 1;
            return None;
        }

        let address = usize::from(self.a);
        let y = if instruction & (1 << 12) != 0 {
            self.ram[address]
        } else {
            self.a
        };
        let out = alu((instruction >> 6) & 0x3F, self.d, y);
        let dest = (instruction >> 3) & 0b111;
        let target = self.a;
        if dest & 0b001 != 0 {
            self.ram[address] = out;
        }
        if dest & 0b010 != 0 {
            self.d = out;
        }
        if dest & 0b100 != 0 {
            self.a = out;
        }
        self.pc = if should_jump(instruction & 0b111, out) {
            target
        } else {
            self.pc + 1
        };
        None
    }

    pub fn run(&mut self, max_cycles: usize) -> Stop {
        self.run_until(None, max_cycles)
    }

    /// Run until PC equals `target`, the program stops, or the cycle bound hits.
    pub fn run_until(&mut self, target: Option<u16>, max_cycles: usize) -> Stop {
        while self.cycles < max_cycles {
            if Some(self.pc) == target {
                return Stop::Reached;
            }
            if let Some(stop) = self.step() {
                return stop;
            }
        }
        Stop::OutOfCycles
    }

    pub fn sp(&self) -> u16 {
        self.ram[0]
    }

    pub fn top(&self) -> Option<i16> {
        let sp = usize::from(self.sp());
        (sp > 256).then(|| self.ram[sp - 1] as i16)
    }

    pub fn stack(&self) -> Vec<i16> {
        self.ram[256..usize::from(self.sp())]
            .iter()
            .map(|&w| w as i16)
            .collect()
    }

    /// SP, LCL, ARG, THIS, THAT.
    pub fn pointers(&self) -> [u16; 5] {
        [self.ram[0], self.ram[1], self.ram[2], self.ram[3], self.ram[4]]
    }
}

pub fn translate(units: &[(&str, &str)], config: TranslatorConfig) -> String {
    let units: Vec<Unit> = units
        .iter()
        .map(|(name, source)| Unit::new(*name, *source))
        .collect();
    translate_units(&units, config).expect("translation succeeds")
}

/// Assemble and load `asm`, with `ram` presets applied before the first cycle.
pub fn load(asm: &str, ram: &[(usize, u16)]) -> (Cpu, Program) {
    let program = assemble(asm).expect("generated assembly assembles");
    let mut cpu = Cpu::new(program.code.clone());
    for &(addr, value) in ram {
        cpu.ram[addr] = value;
    }
    (cpu, program)
}

/// Translate a bare command stream (no bootstrap) and run it with SP at 256.
pub fn run_bare(source: &str, ram: &[(usize, u16)]) -> Cpu {
    let asm = translate(&[("Main", source)], TranslatorConfig::default().bootstrap(false));
    let mut presets = vec![(0, 256)];
    presets.extend_from_slice(ram);
    let (mut cpu, _) = load(&asm, &presets);
    assert_eq!(cpu.run(100_000), Stop::Finished);
    cpu
}

/// Translate units behind the bootstrap and run until `halt_label` is reached.
pub fn run_program(units: &[(&str, &str)], halt_label: &str, max_cycles: usize) -> Cpu {
    let asm = translate(units, TranslatorConfig::default());
    let (mut cpu, program) = load(&asm, &[]);
    let target = program.symbols.get(halt_label).copied();
    assert!(target.is_some(), "no label {}", halt_label);
    assert_eq!(cpu.run_until(target, max_cycles), Stop::Reached);
    cpu
}
