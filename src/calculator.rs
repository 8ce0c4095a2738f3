//! A stack calculator whose every user visible change goes through the
//! engine and is recorded in a journal, so it can be undone, redone, dumped
//! and replayed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::blackboard::NO_PAYLOAD;
use crate::datatype::TypedCell;
use crate::engine::{Emitter, Engine};
use crate::error::Result;
use crate::guard;
use crate::journal::{Journal, Transaction};
use crate::scan::{self, Span};

pub const CALCULATOR_SCRIPT: &str = r#"
    PUSH_VALUE = (push_value -> PUSH_VALUE "push_value")
    POP_VALUE = (pop_value -> POP_VALUE "pop_value")
    ADD = (add -> ADD "add")
    SUBTRACT = (subtract -> SUBTRACT "subtract")
    MULTIPLY = (multiply -> MULTIPLY "multiply")
    DIVIDE = (divide -> DIVIDE "divide")
    UNDO = (undo -> UNDO "undo")
    REDO = (redo -> REDO "redo")
    // quitting is a one way trip
    QUIT = (quit -> STOP "join_now")
"#;

pub type Stack = Arc<Mutex<Vec<f32>>>;

// ------------- Command -------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Push(f32),
    Pop,
    Add,
    Subtract,
    Multiply,
    Divide,
    Undo,
    Redo,
    Quit,
}

impl Command {
    /// Reads one line of user input: a number, an operator symbol or a word.
    pub fn parse(input: &str) -> Option<Command> {
        let text = scan::strip(Span::new(input));
        let command = match text.as_bytes() {
            b"+" | b"add" => Command::Add,
            b"-" | b"subtract" => Command::Subtract,
            b"*" | b"multiply" => Command::Multiply,
            b"/" | b"divide" => Command::Divide,
            b"pop" => Command::Pop,
            b"undo" => Command::Undo,
            b"redo" => Command::Redo,
            b"quit" | b"exit" => Command::Quit,
            _ => Command::Push(parse_number(text)?),
        };
        Some(command)
    }
    pub fn event(&self) -> &'static str {
        match self {
            Command::Push(_) => "push_value",
            Command::Pop => "pop_value",
            Command::Add => "add",
            Command::Subtract => "subtract",
            Command::Multiply => "multiply",
            Command::Divide => "divide",
            Command::Undo => "undo",
            Command::Redo => "redo",
            Command::Quit => "quit",
        }
    }
    pub fn emit(self, emitter: &Emitter) {
        match self {
            Command::Push(value) => {
                emitter.emit_with(self.event(), TypedCell::new(value));
            }
            _ => emitter.emit(self.event(), NO_PAYLOAD),
        }
    }
}

// the whole of `text` must be a finite number with a digit before any exponent
fn parse_number(text: Span<'_>) -> Option<f32> {
    let (rest, value) = scan::get_float(text);
    let mantissa = text.as_bytes().split(|&c| matches!(c, b'e' | b'E')).next()?;
    let digits = mantissa.iter().any(|c| scan::is_numeric(*c));
    (rest.is_empty() && digits && value.is_finite()).then_some(value)
}

// a pushed value arrives either as a number or, when replayed from a dump, as
// the text `Display` wrote for it; std parsing reverses that bit for bit
fn operand(cell: &TypedCell) -> Option<f32> {
    if let Some(value) = cell.value::<f32>() {
        return Some(*value);
    }
    let text = cell.value::<String>()?.trim();
    text.parse::<f32>().ok().filter(|value| value.is_finite())
}

// ------------- Transactions -------------
fn push_transaction(stack: &Stack, value: f32) -> Transaction {
    let forward = Arc::clone(stack);
    let backward = Arc::clone(stack);
    Transaction::new(
        "push_value",
        move || guard(&forward).push(value),
        move || {
            guard(&backward).pop();
        },
    )
    .with_data(TypedCell::new(value))
}

fn pop_transaction(stack: &Stack) -> Option<Transaction> {
    let value = *guard(stack).last()?;
    let forward = Arc::clone(stack);
    let backward = Arc::clone(stack);
    Some(Transaction::new(
        "pop_value",
        move || {
            guard(&forward).pop();
        },
        move || guard(&backward).push(value),
    ))
}

// replaces the top two values with op(second, top)
fn binary_transaction(stack: &Stack, label: &'static str, op: fn(f32, f32) -> f32) -> Option<Transaction> {
    let (value1, value2) = match guard(stack).as_slice() {
        [.., value1, value2] => (*value1, *value2),
        _ => return None,
    };
    let forward = Arc::clone(stack);
    let backward = Arc::clone(stack);
    Some(Transaction::new(
        label,
        move || {
            let mut values = guard(&forward);
            values.pop();
            values.pop();
            values.push(op(value1, value2));
        },
        move || {
            let mut values = guard(&backward);
            values.pop();
            values.push(value1);
            values.push(value2);
        },
    ))
}

// ------------- Calculator -------------
pub struct Calculator {
    engine: Engine,
    stack: Stack,
    journal: Arc<Journal>,
    quit: Arc<AtomicBool>,
}

impl Calculator {
    pub fn new() -> Result<Self> {
        Self::with_script(CALCULATOR_SCRIPT)
    }
    /// Builds the calculator on a custom script. Only the output labels the
    /// calculator binds (`push_value`, `pop_value`, `add`, `subtract`,
    /// `multiply`, `divide`, `undo`, `redo`, `join_now`) do anything.
    pub fn with_script(script: &str) -> Result<Self> {
        let calculator = Self {
            engine: Engine::parse(script)?,
            stack: Arc::default(),
            journal: Arc::new(Journal::new()),
            quit: Arc::new(AtomicBool::new(false)),
        };
        calculator.bind_callbacks();
        Ok(calculator)
    }

    fn bind_callbacks(&self) {
        let stack = Arc::clone(&self.stack);
        let journal = Arc::clone(&self.journal);
        let blackboard = Arc::clone(self.engine.blackboard());
        self.engine.bind("push_value", move |handle| {
            let Some(cell) = blackboard.take(handle) else {
                return;
            };
            match operand(&cell) {
                Some(value) => journal.perform(push_transaction(&stack, value)),
                None => warn!(data_type = cell.data_type(), payload = %cell, "push_value payload discarded"),
            }
        });

        let stack = Arc::clone(&self.stack);
        let journal = Arc::clone(&self.journal);
        self.engine.bind("pop_value", move |_| {
            if let Some(transaction) = pop_transaction(&stack) {
                journal.perform(transaction);
            }
        });

        let operations: [(&'static str, fn(f32, f32) -> f32); 4] = [
            ("add", |a, b| a + b),
            ("subtract", |a, b| a - b),
            ("multiply", |a, b| a * b),
            ("divide", |a, b| a / b),
        ];
        for (label, op) in operations {
            let stack = Arc::clone(&self.stack);
            let journal = Arc::clone(&self.journal);
            self.engine.bind(label, move |_| match binary_transaction(&stack, label, op) {
                Some(transaction) => journal.perform(transaction),
                None => debug!(label, "needs two values on the stack"),
            });
        }

        let journal = Arc::clone(&self.journal);
        self.engine.bind("undo", move |_| {
            journal.undo();
        });
        let journal = Arc::clone(&self.journal);
        self.engine.bind("redo", move |_| {
            journal.redo();
        });

        let quit = Arc::clone(&self.quit);
        self.engine.bind("join_now", move |_| quit.store(true, Ordering::SeqCst));
    }

    /// Queues `command`; it takes effect on the next [`Calculator::update`].
    pub fn send(&self, command: Command) {
        command.emit(&self.engine.emitter());
    }
    pub fn update(&self) -> usize {
        self.engine.update()
    }
    pub fn stack(&self) -> Vec<f32> {
        guard(&self.stack).clone()
    }
    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }
    /// Shared with producer threads for cooperative shutdown.
    pub fn quit_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.quit)
    }
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
    pub fn journal(&self) -> &Arc<Journal> {
        &self.journal
    }

    /// Queues the entries of a journal dump. They are applied, and journaled
    /// again, on the next update.
    pub fn replay_journal(&self, path: impl AsRef<std::path::Path>) -> Result<usize> {
        let entries = Journal::load_from_path(path)?;
        Ok(self.engine.replay(entries))
    }
    pub fn save_journal(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.journal.save_to_path(path)
    }
}
