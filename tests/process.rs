use csplab::CspError;
use csplab::process::{ANONYMOUS_PREFIX, ProcessState, ProcessTable};

const CLOCKS: &str = r#"
    CLOCK = (tick -> CLOCK "ticked")
    CLOCK2 = (tick -> (tock -> CLOCK2 "tocked") "ticked")
"#;

#[test]
fn one_record_per_definition_plus_one_per_nesting() {
    let table = ProcessTable::parse(CLOCKS).expect("parse ok");
    let names: Vec<&str> = table.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["CLOCK", "CLOCK2", "__CLOCK2_0"]);

    let clock2 = table.get("CLOCK2").unwrap();
    assert_eq!(clock2.event(), "tick");
    assert_eq!(clock2.behavior(), "__CLOCK2_0");
    assert_eq!(clock2.out(), "ticked");

    let nested = table.get("__CLOCK2_0").unwrap();
    assert!(nested.is_anonymous());
    assert_eq!(nested.event(), "tock");
    assert_eq!(nested.behavior(), "CLOCK2");
    assert_eq!(nested.out(), "tocked");
}

#[test]
fn anonymous_processes_start_inactive() {
    let table = ProcessTable::parse(CLOCKS).unwrap();
    assert_eq!(
        table.states(),
        &[ProcessState::Active, ProcessState::Active, ProcessState::Inactive]
    );
    assert_eq!(table.active().collect::<Vec<_>>(), vec!["CLOCK", "CLOCK2"]);
}

#[test]
fn deep_nesting_gets_unique_names() {
    let table = ProcessTable::parse("A = (a -> (b -> (c -> A)))").unwrap();
    let names: Vec<&str> = table.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["A", "__A_0", "____A_0_1"]);
    assert!(names[1..].iter().all(|n| n.starts_with(ANONYMOUS_PREFIX)));
    assert_eq!(table.get("____A_0_1").unwrap().behavior(), "A");
}

#[test]
fn labels_and_comments_are_optional() {
    let table = ProcessTable::parse(
        "// a process without output\nP = (e -> P)\n/* and one */ Q = ( f -> P /* with */ \"q\" )",
    )
    .unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("P").unwrap().out(), "");
    assert!(table.get("P").unwrap().is_recursive());
    assert_eq!(table.get("Q").unwrap().out(), "q");
    assert!(ProcessTable::parse("  \n // nothing\n").unwrap().is_empty());
}

#[test]
fn records_render_as_script() {
    let table = ProcessTable::parse(CLOCKS).unwrap();
    let rendered: Vec<String> = table.iter().map(|p| p.to_string()).collect();
    assert_eq!(rendered[0], "CLOCK = (tick -> CLOCK \"ticked\")");
    assert_eq!(rendered[2], "__CLOCK2_0 = (tock -> CLOCK2 \"tocked\")");
    assert_eq!(ProcessTable::parse("P = (e -> P)").unwrap().get("P").unwrap().to_string(), "P = (e -> P)");
}

#[test]
fn chained_arrows_are_rejected() {
    let result = ProcessTable::parse("X = (a -> b -> c)");
    assert!(matches!(result, Err(CspError::Parse { .. })));
}

#[test]
fn syntax_errors_report_the_failing_position() {
    match ProcessTable::parse("A = (a -> A)\nB (b -> B)") {
        Err(CspError::Parse { line, col, offset, .. }) => {
            assert_eq!((line, col, offset), (2, 3, 15));
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
    for broken in [
        "A = a -> A)",
        "A = (a -> A",
        "A = (a A)",
        "A = (-> A)",
        "A = (a -> )",
        "A = (a -> A \"open)",
        "= (a -> A)",
    ] {
        assert!(ProcessTable::parse(broken).is_err(), "{broken} should not parse");
    }
}

#[test]
fn merge_appends_and_keeps_existing_states() {
    let mut table = ProcessTable::parse(CLOCKS).unwrap();
    table.dispatch("tick", |_| {});
    assert_eq!(table.state("CLOCK2"), Some(ProcessState::Inactive));

    assert_eq!(table.merge("BELL = (ring -> (silence -> BELL))").unwrap(), 2);
    assert_eq!(table.len(), 5);
    assert_eq!(table.state("CLOCK2"), Some(ProcessState::Inactive));
    assert_eq!(table.state("BELL"), Some(ProcessState::Active));
    assert_eq!(table.state("__BELL_0"), Some(ProcessState::Inactive));
}

#[test]
fn failed_merge_leaves_the_table_alone() {
    let mut table = ProcessTable::parse(CLOCKS).unwrap();
    assert!(table.merge("OK = (e -> OK)\nBAD = (e -> ").is_err());
    assert_eq!(table.len(), 3);
    assert!(table.get("OK").is_none());

    // names stay unique, and the anonymous prefix is reserved
    assert!(table.merge("CLOCK = (e -> CLOCK)").is_err());
    assert!(table.merge("D = (e -> D)\nD = (f -> D)").is_err());
    assert!(table.merge("__X = (e -> __X)").is_err());
    assert_eq!(table.len(), 3);
}

#[test]
fn dispatch_holds_successors_until_the_event_is_done() {
    let mut table = ProcessTable::parse("T = (tick -> (tick -> T \"second\") \"first\")").unwrap();
    let mut fired = Vec::new();
    assert_eq!(table.dispatch("tick", |p| fired.push(p.out().to_string())), 1);
    assert_eq!(fired, vec!["first"]);
    assert_eq!(table.state("T"), Some(ProcessState::Inactive));
    assert_eq!(table.state("__T_0"), Some(ProcessState::Active));

    table.dispatch("tick", |p| fired.push(p.out().to_string()));
    assert_eq!(fired, vec!["first", "second"]);
    assert_eq!(table.state("T"), Some(ProcessState::Active));
}

#[test]
fn unknown_successor_ends_the_branch() {
    let mut table = ProcessTable::parse("QUIT = (quit -> STOP \"bye\")").unwrap();
    assert_eq!(table.dispatch("quit", |_| {}), 1);
    assert_eq!(table.dispatch("quit", |_| {}), 0);
    assert_eq!(table.active().count(), 0);
    assert_eq!(table.state("STOP"), None);
}
