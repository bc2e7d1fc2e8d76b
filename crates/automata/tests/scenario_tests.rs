use automata::{parse_regex, AutomatonError, RegexError, DFA, NFA};

fn run_vectors(
    tests: &Vec<(&str, bool)>,
    accepts: impl Fn(&str) -> Result<bool, AutomatonError>,
    what: &str,
) {
    for (test, expected_result) in tests {
        let result = accepts(*test).expect("automaton must have a start node");
        assert_eq!(
            result, *expected_result,
            "'{}' failed on input '{}', expect match: {}, actual match: {}",
            what, test, expected_result, result
        );
    }
}

#[test]
fn deterministic_build_and_query() {
    let mut dfa = DFA::new();
    dfa.add_start("A").unwrap();
    dfa.add_transition("A", '0', "A").unwrap();
    dfa.add_transition("A", '1', "B").unwrap();
    dfa.add_transition("B", '0', "C").unwrap();
    dfa.add_transition("B", '1', "A").unwrap();
    dfa.add_transition("C", '1', "C").unwrap();
    dfa.add_transition("C", '0', "B").unwrap();
    dfa.add_final("A").unwrap();

    let tests = vec![("0000", true), ("0011000111", false), ("01011110100", true)];
    run_vectors(&tests, |w| dfa.is_member(w), "scenario 1");

    assert_eq!(
        dfa.to_string(),
        "Start: A\nA (0, A) (1, B)\nB (0, C) (1, A)\nC (1, C) (0, B)\nFinals: A\n"
    );
}

#[test]
fn regex_scenarios() {
    let nfa = parse_regex("ab.(abc*+bc)*.ca").unwrap();
    run_vectors(&vec![("ababcca", true), ("abcc", false)], |w| nfa.is_member(w), "scenario 2");

    let nfa = parse_regex("(ab+ba)&(ab+b)").unwrap();
    run_vectors(
        &vec![("ab", true), ("ba", false), ("b", false)],
        |w| nfa.is_member(w),
        "scenario 3",
    );
}

#[test]
fn extraction_scenario() {
    let mut dfa = DFA::new();
    dfa.add_start("A").unwrap();
    dfa.add_transition("A", 'a', "B").unwrap();
    dfa.add_transition("A", 'b', "C").unwrap();
    dfa.add_transition("B", 'a', "C").unwrap();
    dfa.add_transition("B", 'b', "D").unwrap();
    dfa.add_transition("C", 'b', "B").unwrap();
    dfa.add_final("D").unwrap();
    dfa.add_final("C").unwrap();

    assert_eq!(
        automata::extract_regex(&dfa).unwrap(),
        "((a(ab)*)b+ab+(b(ba)*b)b)+(b+(a(ab)*a)+(b(ba)*))"
    );
}

#[test]
fn failed_instructions_leave_automaton_unchanged() {
    let mut dfa = DFA::new();
    assert_eq!(
        dfa.add_transition("A", 'a', "B"),
        Err(AutomatonError::UnknownSource("A".to_string()))
    );
    dfa.add_start("A").unwrap();
    dfa.add_transition("A", 'a', "B").unwrap();
    let snapshot = dfa.to_string();

    assert!(dfa.add_start("Z").is_err());
    assert!(dfa.add_transition("A", 'a', "C").is_err());
    assert!(dfa.add_final("C").is_err());
    assert_eq!(dfa.to_string(), snapshot);

    let mut nfa = NFA::new();
    nfa.add_start("s").unwrap();
    nfa.add_transition("s", 'a', "t").unwrap();
    assert_eq!(
        nfa.add_final("u"),
        Err(AutomatonError::UnknownFinal("u".to_string()))
    );
}

#[test]
fn regex_errors() {
    assert_eq!(parse_regex("").unwrap_err(), RegexError::Empty);
    assert!(matches!(parse_regex("a.(b+c"), Err(RegexError::Malformed { .. })));
    assert!(matches!(parse_regex("a..b"), Err(RegexError::Malformed { position: 2, .. })));
}

#[test]
fn conversions_between_variants() {
    let nfa = parse_regex("(a+b)*.abb").unwrap();
    let dfa = nfa.to_dfa().unwrap();
    let back = dfa.to_nfa();

    let tests = vec![
        ("abb", true),
        ("aabb", true),
        ("babb", true),
        ("ab", false),
        ("abba", false),
        ("", false),
    ];
    run_vectors(&tests, |w| nfa.is_member(w), "nfa");
    run_vectors(&tests, |w| dfa.is_member(w), "dfa");
    run_vectors(&tests, |w| back.is_member(w), "dfa as nfa");
}

#[test]
fn stream_prefix() {
    let nfa = parse_regex("ab*.c").unwrap();
    let dfa = nfa.to_dfa().unwrap();
    assert_eq!(dfa.shortest_accepted_prefix("abbbcab"), Ok(Some("abbbc")));
    assert_eq!(dfa.shortest_accepted_prefix("ac"), Ok(Some("ac")));
    assert_eq!(dfa.shortest_accepted_prefix("bc"), Ok(None));
}
