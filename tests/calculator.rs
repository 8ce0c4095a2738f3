use csplab::blackboard::NO_PAYLOAD;
use csplab::calculator::{Calculator, Command};
use csplab::datatype::TypedCell;
use csplab::process::ProcessState;

fn run(calculator: &Calculator, commands: &[Command]) {
    for command in commands {
        calculator.send(*command);
    }
    calculator.update();
}

#[test]
fn commands_from_text() {
    assert_eq!(Command::parse("  2.5 "), Some(Command::Push(2.5)));
    assert_eq!(Command::parse("-3"), Some(Command::Push(-3.0)));
    assert_eq!(Command::parse("1e2"), Some(Command::Push(100.0)));
    assert_eq!(Command::parse("+"), Some(Command::Add));
    assert_eq!(Command::parse("-"), Some(Command::Subtract));
    assert_eq!(Command::parse("multiply"), Some(Command::Multiply));
    assert_eq!(Command::parse("/"), Some(Command::Divide));
    assert_eq!(Command::parse("pop"), Some(Command::Pop));
    assert_eq!(Command::parse("undo"), Some(Command::Undo));
    assert_eq!(Command::parse("redo"), Some(Command::Redo));
    assert_eq!(Command::parse("quit"), Some(Command::Quit));
    assert_eq!(Command::parse("two"), None);
    assert_eq!(Command::parse("3x"), None);
    assert_eq!(Command::parse("."), None);
    assert_eq!(Command::parse(""), None);
    assert_eq!(Command::parse(".5e1"), Some(Command::Push(5.0)));
}

#[test]
fn numbers_need_a_mantissa_and_a_finite_value() {
    assert_eq!(Command::parse("e5"), None);
    assert_eq!(Command::parse("-E2"), None);
    assert_eq!(Command::parse("1e40"), None);
    assert_eq!(Command::parse("-1e40"), None);
    assert!(matches!(Command::parse("3e38"), Some(Command::Push(value)) if value.is_finite()));
}

#[test]
fn arithmetic() {
    let calculator = Calculator::new().unwrap();
    run(&calculator, &[Command::Push(2.0), Command::Push(3.0), Command::Add]);
    assert_eq!(calculator.stack(), vec![5.0]);
    run(&calculator, &[Command::Push(4.0), Command::Multiply]);
    assert_eq!(calculator.stack(), vec![20.0]);
    run(&calculator, &[Command::Push(8.0), Command::Subtract]);
    assert_eq!(calculator.stack(), vec![12.0]);
    run(&calculator, &[Command::Push(3.0), Command::Divide]);
    assert_eq!(calculator.stack(), vec![4.0]);
    run(&calculator, &[Command::Pop]);
    assert!(calculator.stack().is_empty());
}

#[test]
fn operators_need_two_values() {
    let calculator = Calculator::new().unwrap();
    run(&calculator, &[Command::Push(2.0)]);
    for op in [Command::Add, Command::Subtract, Command::Multiply, Command::Divide] {
        run(&calculator, &[op]);
    }
    assert_eq!(calculator.stack(), vec![2.0]);
    assert_eq!(calculator.journal().len(), 1);

    // popping an empty stack is ignored too
    run(&calculator, &[Command::Pop, Command::Pop]);
    assert!(calculator.stack().is_empty());
    assert_eq!(calculator.journal().len(), 2);
}

#[test]
fn undo_and_redo_through_events() {
    let calculator = Calculator::new().unwrap();
    run(&calculator, &[Command::Push(2.0), Command::Push(3.0), Command::Add]);
    run(&calculator, &[Command::Undo]);
    assert_eq!(calculator.stack(), vec![2.0, 3.0]);
    run(&calculator, &[Command::Redo]);
    assert_eq!(calculator.stack(), vec![5.0]);

    // a new command after undo drops what could have been redone
    run(&calculator, &[Command::Undo, Command::Undo, Command::Push(7.0), Command::Redo]);
    assert_eq!(calculator.stack(), vec![2.0, 7.0]);
    assert_eq!(calculator.journal().labels(), vec!["push_value", "push_value"]);
}

#[test]
fn quit_fires_once() {
    let calculator = Calculator::new().unwrap();
    assert!(!calculator.quit_requested());
    run(&calculator, &[Command::Quit]);
    assert!(calculator.quit_requested());
    assert_eq!(calculator.engine().state("QUIT"), Some(ProcessState::Inactive));
}

#[test]
fn foreign_payloads_are_discarded() {
    let calculator = Calculator::new().unwrap();
    calculator.engine().emit_with("push_value", TypedCell::new(true));
    calculator.engine().emit_with("push_value", TypedCell::new(String::from(" 6 ")));
    calculator.update();
    assert_eq!(calculator.stack(), vec![6.0]);
    assert!(calculator.engine().blackboard().is_empty());
}

#[test]
fn journal_dump_replays_into_a_fresh_calculator() {
    let path = std::env::temp_dir().join(format!("csplab-calculator-{}.log", std::process::id()));
    let calculator = Calculator::new().unwrap();
    run(&calculator, &[Command::Push(1.5), Command::Push(2.0), Command::Subtract, Command::Push(9.0), Command::Undo]);
    assert_eq!(calculator.stack(), vec![-0.5]);
    calculator.save_journal(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "push_value: 1.5\npush_value: 2\nsubtract: \n");

    let replayed = Calculator::new().unwrap();
    assert_eq!(replayed.replay_journal(&path).unwrap(), 3);
    let _ = std::fs::remove_file(&path);
    replayed.update();
    assert_eq!(replayed.stack(), vec![-0.5]);
    assert_eq!(replayed.journal().len(), 3);
}

#[test]
fn custom_scripts_drive_the_same_callbacks() {
    // event names need not match the labels they trigger
    let calculator = Calculator::with_script(
        "TOTAL = (number -> TOTAL \"push_value\")\nSUM = (sum -> SUM \"add\")\nCLOSE = (close -> STOP \"join_now\")",
    )
    .unwrap();
    let engine = calculator.engine();
    engine.emit_with("number", TypedCell::new(2.0f32));
    engine.emit_with("number", TypedCell::new(3.0f32));
    engine.emit("sum", NO_PAYLOAD);
    engine.emit("close", NO_PAYLOAD);
    calculator.update();
    assert_eq!(calculator.stack(), vec![5.0]);
    assert!(calculator.quit_requested());

    // the built-in event names mean nothing to this script
    run(&calculator, &[Command::Push(1.0)]);
    assert_eq!(calculator.stack(), vec![5.0]);
    assert!(Calculator::with_script("BROKEN = (").is_err());
}

#[test]
fn replayed_values_are_bit_identical() {
    let path = std::env::temp_dir().join(format!("csplab-exact-{}.log", std::process::id()));
    let calculator = Calculator::new().unwrap();
    for text in ["0.0001", "0.1234", "3.14159", "-2.7e-3", "123456.7", "9.9999"] {
        calculator.send(Command::parse(text).unwrap());
    }
    calculator.send(Command::Add);
    calculator.update();
    calculator.save_journal(&path).unwrap();

    let replayed = Calculator::new().unwrap();
    replayed.replay_journal(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    replayed.update();

    let bits = |stack: Vec<f32>| stack.into_iter().map(f32::to_bits).collect::<Vec<_>>();
    assert_eq!(calculator.stack().len(), 5);
    assert_eq!(bits(replayed.stack()), bits(calculator.stack()));
}

#[test]
fn non_finite_text_payloads_are_discarded() {
    let calculator = Calculator::new().unwrap();
    for text in ["inf", "-inf", "NaN", "e5"] {
        calculator.engine().emit_with("push_value", TypedCell::new(text.to_string()));
    }
    calculator.engine().emit_with("push_value", TypedCell::new(String::from("1")));
    calculator.update();
    assert_eq!(calculator.stack(), vec![1.0]);
    assert_eq!(calculator.journal().len(), 1);
}
