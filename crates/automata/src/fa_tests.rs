use crate::dfa::DFA;
use crate::fa::AutomatonError;
use crate::nfa::NFA;
use crate::regex::parse_regex;

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

fn run_regex_vectors(re_str: &str, tests: &Vec<(&str, bool)>) {
    let nfa = parse_regex(re_str).expect("failed to parse regex");
    run_vectors(tests, |w| nfa.is_member(w), re_str);

    let dfa = nfa.to_dfa().expect("failed to determinize");
    run_vectors(tests, |w| dfa.is_member(w), re_str);
}

fn dfa_from(start: &str, transitions: &[(&str, char, &str)], finals: &[&str]) -> DFA {
    let mut dfa = DFA::new();
    dfa.add_start(start).unwrap();
    for (from, symbol, to) in transitions {
        dfa.add_transition(from, *symbol, to).unwrap();
    }
    for name in finals {
        dfa.add_final(name).unwrap();
    }
    dfa
}

fn nfa_from(start: &str, transitions: &[(&str, char, &str)], finals: &[&str]) -> NFA {
    let mut nfa = NFA::new();
    nfa.add_start(start).unwrap();
    for (from, label, to) in transitions {
        nfa.add_transition(from, *label, to).unwrap();
    }
    for name in finals {
        nfa.add_final(name).unwrap();
    }
    nfa
}

fn mod_three() -> DFA {
    dfa_from(
        "A",
        &[
            ("A", '0', "A"),
            ("A", '1', "B"),
            ("B", '0', "C"),
            ("B", '1', "A"),
            ("C", '1', "C"),
            ("C", '0', "B"),
        ],
        &["A"],
    )
}

#[test]
fn dfa_mod_three() {
    let dfa = mod_three();
    let tests = vec![
        ("", true),
        ("0000", true),
        ("0011000111", false),
        ("01011110100", true),
        ("11", true),
        ("10", false),
        ("110", true),
        ("1001", true),
        ("102", false),
    ];
    run_vectors(&tests, |w| dfa.is_member(w), "mod three");
}

#[test]
fn dfa_complement_of_mod_three() {
    let dfa = mod_three().complement();
    let tests = vec![
        ("", false),
        ("0000", false),
        ("0011000111", true),
        ("01011110100", false),
        ("10", true),
    ];
    run_vectors(&tests, |w| dfa.is_member(w), "not mod three");
}

#[test]
fn dfa_product_with_parity() {
    let parity = dfa_from(
        "even",
        &[
            ("even", '0', "odd"),
            ("even", '1', "even"),
            ("odd", '0', "even"),
            ("odd", '1', "odd"),
        ],
        &["even"],
    );
    let both = DFA::intersection(&mod_three(), &parity);
    let tests = vec![
        ("", true),
        ("0", false),
        ("00", true),
        ("11", true),
        ("110", false),
        ("1100", true),
        ("10", false),
    ];
    run_vectors(&tests, |w| both.is_member(w), "mod three and even zeros");

    let either = DFA::union(&mod_three(), &parity);
    let tests = vec![
        ("", true),
        ("0", true),
        ("10", false),
        ("100", true),
        ("1000", false),
        ("11", true),
    ];
    run_vectors(&tests, |w| either.is_member(w), "mod three or even zeros");
}

#[test]
fn nfa_membership() {
    let nfa = nfa_from(
        "0",
        &[
            ("0", 'a', "1"),
            ("0", '@', "2"),
            ("1", 'a', "3"),
            ("2", 'b', "2"),
            ("2", '@', "4"),
            ("3", 'a', "0"),
            ("3", '@', "5"),
            ("4", 'a', "6"),
            ("5", 'b', "7"),
            ("6", '@', "0"),
            ("7", 'a', "5"),
        ],
        &["5", "6"],
    );
    let tests = vec![
        ("a", true),
        ("aa", true),
        ("aab", false),
        ("aaba", true),
        ("ba", true),
        ("bbba", true),
        ("b", false),
        ("", false),
        ("aaaa", true),
        ("c", false),
    ];
    run_vectors(&tests, |w| nfa.is_member(w), "hand built nfa");

    let dfa = nfa.to_dfa().unwrap();
    run_vectors(&tests, |w| dfa.is_member(w), "determinized nfa");
}

#[test]
fn nfa_union_and_concatenation_of_words() {
    let a = nfa_from("s", &[("s", 'a', "s"), ("s", 'd', "f")], &["f"]);
    let b = nfa_from("s", &[("s", 'e', "f"), ("f", 'e', "f")], &["f"]);

    let either = NFA::union(&a, &b);
    let tests = vec![
        ("d", true),
        ("aaad", true),
        ("e", true),
        ("eee", true),
        ("", false),
        ("ae", false),
        ("de", false),
    ];
    run_vectors(&tests, |w| either.is_member(w), "union");

    let both = NFA::concatenation(&a, &b);
    let tests = vec![
        ("de", true),
        ("aadeee", true),
        ("d", false),
        ("e", false),
        ("ed", false),
        ("", false),
    ];
    run_vectors(&tests, |w| both.is_member(w), "concatenation");
}

#[test]
fn word_automaton() {
    let nfa = NFA::from_word("abc");
    run_vectors(&vec![("abc", true), ("abcc", false), ("", false)], |w| nfa.is_member(w), "abc");
}

#[test]
fn regex_with_star_group() {
    let tests = vec![
        ("ababcca", true),
        ("ababca", true),
        ("ababcccccca", true),
        ("abbcbcabcbcca", true),
        ("abca", true),
        ("ababcabcbcabcccabca", true),
        ("abcabcbcabcccabca", false),
        ("abacca", false),
        ("caca", false),
        ("abcc", false),
    ];
    run_regex_vectors("ab.(abc*+bc)*.ca", &tests);
}

#[test]
fn regex_with_intersection() {
    let tests = vec![("ab", true), ("ba", false), ("b", false), ("ac", false)];
    run_regex_vectors("(ab+ba)&(ab+b)", &tests);
}

#[test]
fn regex_precedence() {
    let tests = vec![
        ("ab", true),
        ("abc", true),
        ("abcc", true),
        ("c", false),
        ("", false),
        ("abd", false),
    ];
    run_regex_vectors("ab+abc*.c", &tests);

    let tests = vec![("", true), ("ab", true), ("abab", true), ("aba", false), ("abb", false)];
    run_regex_vectors("(ab)*", &tests);
}

#[test]
fn extracted_regex_round_trip() {
    let dfa = dfa_from(
        "A",
        &[
            ("A", 'a', "B"),
            ("A", 'b', "C"),
            ("B", 'a', "C"),
            ("B", 'b', "D"),
            ("C", 'b', "B"),
        ],
        &["D", "C"],
    );
    let regex = dfa.to_regex().unwrap();
    assert_eq!(regex, "((a(ab)*)b+ab+(b(ba)*b)b)+(b+(a(ab)*a)+(b(ba)*))");

    let nfa = parse_regex(&regex).unwrap();
    let tests = vec![
        ("b", true),
        ("ab", true),
        ("aa", true),
        ("bb", false),
        ("bbb", true),
        ("aabb", true),
        ("aab", false),
        ("", false),
        ("ba", false),
    ];
    run_vectors(&tests, |w| dfa.is_member(w), "scenario dfa");
    run_vectors(&tests, |w| nfa.is_member(w), &regex);
}
