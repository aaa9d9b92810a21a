use crate::ast::{ArithmeticOp, Command, Segment};
use crate::error::GenerationError;
use crate::symbols::{self, FRAME_WORDS, MAX_CONSTANT, SCRATCH_ADDR, SCRATCH_RET, TEMP_SIZE};

macro_rules! svec {
    ($($x:expr),* $(,)?) => (vec![$($x.to_string()),*]);
}

fn at_c(arg: u16) -> String {
    format!("@{arg}", arg = arg)
}

fn at_s(arg: &str) -> String {
    format!("@{arg}", arg = arg)
}

fn label_decl(label: &str) -> String {
    format!("({})", label)
}

/// Push D onto the stack.
fn push_d() -> Vec<String> {
    svec![
        "@SP",
        "M=M+1",
        "A=M-1", // Don't need to refetch SP; this is safe
        "M=D"
    ]
}

fn push_zero() -> Vec<String> {
    svec!["@SP", "M=M+1", "A=M-1", "M=0"]
}

/// Pop the top of the stack into D.
fn pop_d() -> Vec<String> {
    svec![
        "@SP",
        "AM=M-1", // SP--, A <- new SP (val to be popped)
        "D=M"
    ]
}

/// Push microcode for the four based segments
fn seg_push(base: &str, arg: u16) -> Vec<String> {
    let mut asm = svec![
        at_s(base),
        "D=M",
        at_c(arg),
        "A=D+A", // A = SEG+arg
        "D=M"    // D = value to push
    ];
    asm.extend(push_d());
    asm
}

fn seg_push_direct(symbol: &str) -> Vec<String> {
    let mut asm = svec![at_s(symbol), "D=M"];
    asm.extend(push_d());
    asm
}

fn seg_pop(base: &str, arg: u16) -> Vec<String> {
    let mut asm = svec![
        at_s(base),
        "D=M",
        at_c(arg),
        "D=D+A", // D = SEG+arg
        at_s(SCRATCH_ADDR),
        "M=D" // Store target addr in R13
    ];
    asm.extend(pop_d());
    asm.extend(svec![
        at_s(SCRATCH_ADDR),
        "A=M", // At the target address...
        "M=D"  // ... store the popped val
    ]);
    asm
}

fn seg_pop_direct(symbol: &str) -> Vec<String> {
    let mut asm = pop_d();
    asm.extend(svec![at_s(symbol), "M=D"]);
    asm
}

fn simple_un_op(op: char) -> Vec<String> {
    svec!["@SP", "A=M-1", format!("M={}M", op)]
}

// i.e. no conditions or jumps, just pop and run
fn simple_bin_op(comp: &str) -> Vec<String> {
    svec![
        "@SP",
        "AM=M-1", // SP--, looking at top of stack now
        "D=M",    // Right arg in D
        "A=A-1",  // Looking at second arg of stack, will overwrite
        format!("M={}", comp)
    ]
}

/// Where the saved-pointer words of a call frame come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SavedPointers {
    Caller,
    /// The bootstrap has no caller; it saves zeros.
    Placeholder,
}

/// Everything the generator remembers between commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorState {
    /// Current unit, which names its statics.
    pub unit: String,
    /// Enclosing function, which scopes labels.
    pub function: Option<String>,
    pub comparisons: usize,
    pub call_sites: usize,
    /// Working-stack depth since function entry, while it is statically known.
    depth: Option<i32>,
}

impl GeneratorState {
    fn adjust_depth(&mut self, delta: i32) {
        self.depth = self.depth.map(|d| d + delta);
    }
}

/// Lowers VM commands to Hack assembly, one block per command.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    state: GeneratorState,
    annotate: bool,
}

impl CodeGenerator {
    pub fn new(unit: &str) -> Self {
        CodeGenerator {
            state: GeneratorState {
                unit: unit.to_string(),
                ..GeneratorState::default()
            },
            annotate: true,
        }
    }

    pub fn annotated(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    pub fn state(&self) -> &GeneratorState {
        &self.state
    }

    /// Switches the static namespace. Counters and the enclosing function carry over.
    pub fn set_unit(&mut self, unit: &str) {
        self.state.unit = unit.to_string();
    }

    fn next_comparison(&mut self) -> usize {
        let tmp = self.state.comparisons;
        self.state.comparisons += 1;
        tmp
    }

    fn next_call_site(&mut self) -> usize {
        let tmp = self.state.call_sites;
        self.state.call_sites += 1;
        tmp
    }

    fn push(&self, segment: Segment, arg: u16) -> Result<Vec<String>, GenerationError> {
        let asm = match segment {
            Segment::Constant => {
                if arg > MAX_CONSTANT {
                    return Err(GenerationError::ConstantOutOfRange(arg));
                }
                let mut asm = svec![at_c(arg), "D=A"];
                asm.extend(push_d());
                asm
            }
            Segment::Local => seg_push("LCL", arg),
            Segment::Argument => seg_push("ARG", arg),
            Segment::This => seg_push("THIS", arg),
            Segment::That => seg_push("THAT", arg),
            Segment::Static => seg_push_direct(&symbols::static_symbol(&self.state.unit, arg)),
            Segment::Temp => seg_push_direct(&temp(arg)?),
            Segment::Pointer => seg_push_direct(pointer(arg)?),
        };
        Ok(asm)
    }

    fn pop(&self, segment: Segment, arg: u16) -> Result<Vec<String>, GenerationError> {
        let asm = match segment {
            Segment::Constant => return Err(GenerationError::PopConstant),
            Segment::Local => seg_pop("LCL", arg),
            Segment::Argument => seg_pop("ARG", arg),
            Segment::This => seg_pop("THIS", arg),
            Segment::That => seg_pop("THAT", arg),
            Segment::Static => seg_pop_direct(&symbols::static_symbol(&self.state.unit, arg)),
            Segment::Temp => seg_pop_direct(&temp(arg)?),
            Segment::Pointer => seg_pop_direct(pointer(arg)?),
        };
        Ok(asm)
    }

    fn compare(&mut self, jump: &str) -> Vec<String> {
        let (cmp_sym, end_sym) = symbols::comparison_labels(self.next_comparison());
        svec![
            "@SP",
            "AM=M-1", // SP--, looking at top of stack now
            "D=M",    // Right arg in D
            "A=A-1",  // Looking at second arg of stack, will overwrite
            "D=M-D",  // first pushed - second pushed
            at_s(&cmp_sym),
            format!("D;J{}", jump),
            "D=0",
            at_s(&end_sym),
            "0;JMP",
            label_decl(&cmp_sym),
            "D=-1",
            label_decl(&end_sym),
            "@SP",
            "A=M-1",
            "M=D"
        ]
    }

    fn arithmetic(&mut self, op: ArithmeticOp) -> Vec<String> {
        match op {
            ArithmeticOp::Not => simple_un_op('!'),
            ArithmeticOp::Neg => simple_un_op('-'),
            ArithmeticOp::Add => simple_bin_op("D+M"),
            ArithmeticOp::Sub => simple_bin_op("M-D"),
            ArithmeticOp::And => simple_bin_op("D&M"),
            ArithmeticOp::Or => simple_bin_op("D|M"),
            ArithmeticOp::Eq => self.compare("EQ"),
            ArithmeticOp::Gt => self.compare("GT"),
            ArithmeticOp::Lt => self.compare("LT"),
        }
    }

    /// Convert a VM label to its function-scoped assembly symbol
    fn label_to_sym(&self, label: &str) -> Result<String, GenerationError> {
        let function = self
            .state
            .function
            .as_deref()
            .ok_or_else(|| GenerationError::LabelOutsideFunction(label.to_string()))?;
        let sym = symbols::scoped_label(function, label);
        if symbols::is_generated(&sym) {
            return Err(GenerationError::ReservedSymbol(sym));
        }
        Ok(sym)
    }

    fn label(&self, label: &str) -> Result<Vec<String>, GenerationError> {
        Ok(svec![label_decl(&self.label_to_sym(label)?)])
    }

    fn goto(&self, label: &str) -> Result<Vec<String>, GenerationError> {
        Ok(svec![
            at_s(&self.label_to_sym(label)?),
            "0;JMP" // Unconditional jump
        ])
    }

    fn if_goto(&self, label: &str) -> Result<Vec<String>, GenerationError> {
        let mut asm = pop_d();
        asm.extend(svec![
            at_s(&self.label_to_sym(label)?),
            "D;JNE" // False is 0
        ]);
        Ok(asm)
    }

    fn function(&mut self, name: &str, n_locals: u16) -> Result<Vec<String>, GenerationError> {
        if symbols::is_generated(name) {
            return Err(GenerationError::ReservedSymbol(name.to_string()));
        }
        self.state.function = Some(name.to_string());
        let mut asm = svec![label_decl(name)];
        for _ in 0..n_locals {
            asm.extend(push_zero());
        }
        Ok(asm)
    }

    fn call(&mut self, name: &str, n_args: u16) -> Result<Vec<String>, GenerationError> {
        let arg_offset = u32::from(n_args) + u32::from(FRAME_WORDS);
        if arg_offset > u32::from(MAX_CONSTANT) {
            return Err(GenerationError::TooManyArguments(n_args));
        }
        Ok(self.call_sequence(name, arg_offset, SavedPointers::Caller))
    }

    fn call_sequence(&mut self, name: &str, arg_offset: u32, saved: SavedPointers) -> Vec<String> {
        let ret = symbols::return_label(name, self.next_call_site());

        let mut asm = svec![at_s(&ret), "D=A"];
        asm.extend(push_d());
        for pointer in symbols::SAVED_POINTERS {
            match saved {
                SavedPointers::Caller => {
                    asm.extend(svec![at_s(pointer), "D=M"]);
                    asm.extend(push_d());
                }
                SavedPointers::Placeholder => asm.extend(push_zero()),
            }
        }
        asm.extend(svec![
            // ARG = SP - nArgs - 5
            "@SP",
            "D=M",
            format!("@{}", arg_offset),
            "D=D-A",
            "@ARG",
            "M=D",
            // LCL = SP
            "@SP",
            "D=M",
            "@LCL",
            "M=D",
            at_s(name),
            "0;JMP",
            label_decl(&ret)
        ]);
        asm
    }

    fn ret(&self) -> Result<Vec<String>, GenerationError> {
        if let (Some(depth), Some(function)) = (self.state.depth, &self.state.function) {
            if depth <= 0 {
                return Err(GenerationError::ReturnWithoutValue(function.clone()));
            }
        }

        let mut asm = svec![
            // FRAME = LCL
            "@LCL",
            "D=M",
            at_s(SCRATCH_ADDR),
            "M=D",
            // RET = *(FRAME - 5)
            at_c(FRAME_WORDS),
            "A=D-A",
            "D=M",
            at_s(SCRATCH_RET),
            "M=D"
        ];
        // *ARG = pop()
        asm.extend(pop_d());
        asm.extend(svec![
            "@ARG",
            "A=M",
            "M=D",
            // SP = ARG + 1
            "@ARG",
            "D=M+1",
            "@SP",
            "M=D"
        ]);
        // Restore in mirror order of the call's pushes
        for (offset, pointer) in (1..).zip(symbols::SAVED_POINTERS.iter().rev()) {
            asm.extend(svec![
                at_s(SCRATCH_ADDR),
                "D=M",
                at_c(offset),
                "A=D-A",
                "D=M",
                at_s(pointer),
                "M=D"
            ]);
        }
        asm.extend(svec![at_s(SCRATCH_RET), "A=M", "0;JMP"]);
        Ok(asm)
    }

    fn track_depth(&mut self, command: &Command) {
        let state = &mut self.state;
        match command {
            Command::Push(..) => state.adjust_depth(1),
            Command::Pop(..) | Command::IfGoto(_) => state.adjust_depth(-1),
            Command::Arithmetic(ArithmeticOp::Neg | ArithmeticOp::Not) => {}
            Command::Arithmetic(_) => state.adjust_depth(-1),
            Command::Call(_, n_args) => state.adjust_depth(1 - i32::from(*n_args)),
            Command::Function(..) => state.depth = Some(0),
            Command::Label(_) | Command::Goto(_) | Command::Return => state.depth = None,
        }
    }

    /// Lower a single command. State is only advanced when lowering succeeds.
    pub fn generate(&mut self, command: &Command) -> Result<Vec<String>, GenerationError> {
        let translated = match command {
            Command::Push(seg, arg) => self.push(*seg, *arg)?,
            Command::Pop(seg, arg) => self.pop(*seg, *arg)?,
            Command::Arithmetic(op) => self.arithmetic(*op),
            Command::Label(sym) => self.label(sym)?,
            Command::Goto(sym) => self.goto(sym)?,
            Command::IfGoto(sym) => self.if_goto(sym)?,
            Command::Function(name, n_locals) => self.function(name, *n_locals)?,
            Command::Call(name, n_args) => self.call(name, *n_args)?,
            Command::Return => self.ret()?,
        };
        self.track_depth(command);

        if self.annotate {
            let mut annotated = vec![format!("// {}", command)];
            annotated.extend(translated);
            Ok(annotated)
        } else {
            Ok(translated)
        }
    }

    /// Set SP to the stack base and call the entry point with no arguments.
    pub fn bootstrap(&mut self, entry_point: &str) -> Vec<String> {
        let mut asm = Vec::new();
        if self.annotate {
            asm.push("// bootstrap".to_string());
        }
        asm.extend(svec![at_c(symbols::STACK_BASE), "D=A", "@SP", "M=D"]);
        if self.annotate {
            asm.push(format!("// call {} 0", entry_point));
        }
        asm.extend(self.call_sequence(
            entry_point,
            u32::from(FRAME_WORDS),
            SavedPointers::Placeholder,
        ));
        asm
    }

    pub fn translate(&mut self, commands: &[Command]) -> Result<Vec<String>, GenerationError> {
        let mut instructions: Vec<String> = vec![];

        for command in commands {
            instructions.extend(self.generate(command)?);
        }

        Ok(instructions)
    }
}

fn temp(arg: u16) -> Result<String, GenerationError> {
    if arg >= TEMP_SIZE {
        return Err(GenerationError::InvalidIndex {
            segment: Segment::Temp,
            index: arg,
        });
    }
    Ok(symbols::temp_symbol(arg))
}

fn pointer(arg: u16) -> Result<&'static str, GenerationError> {
    symbols::pointer_symbol(arg).ok_or(GenerationError::InvalidIndex {
        segment: Segment::Pointer,
        index: arg,
    })
}
