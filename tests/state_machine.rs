use fnv_table::{RunError, State, StateKind, StateMachine};

#[derive(Default, Debug)]
struct Words {
    pos: usize,
    words: Vec<String>,
    current: String,
}

static START: State = State::new("start", StateKind::Start);
static GAP: State = State::new("gap", StateKind::Internal);
static WORD: State = State::new("word", StateKind::Internal);
static DONE: State = State::new("done", StateKind::End);

fn start(_: &[u8], _: &mut Words) -> Option<&'static State> {
    Some(&GAP)
}

fn gap(buf: &[u8], w: &mut Words) -> Option<&'static State> {
    match buf.get(w.pos) {
        None => Some(&DONE),
        Some(b) if b.is_ascii_whitespace() => {
            w.pos += 1;
            Some(&GAP)
        }
        Some(_) => Some(&WORD),
    }
}

fn word(buf: &[u8], w: &mut Words) -> Option<&'static State> {
    match buf.get(w.pos) {
        Some(&b) if !b.is_ascii_whitespace() => {
            if !b.is_ascii() {
                return None;
            }
            w.current.push(char::from(b));
            w.pos += 1;
            Some(&WORD)
        }
        rest => {
            w.words.push(std::mem::take(&mut w.current));
            Some(if rest.is_none() { &DONE } else { &GAP })
        }
    }
}

fn machine<'b>(input: &'b [u8]) -> StateMachine<'static, 'b, Words> {
    let mut m = StateMachine::new(input, Words::default()).unwrap();
    m.add_state(&START, start).unwrap();
    m.add_state(&GAP, gap).unwrap();
    m.add_state(&WORD, word).unwrap();
    m
}

#[test_log::test]
fn splits_words() {
    let mut m = machine(b"  open addressing  with tombstones ");
    let end = m.run().unwrap();
    assert_eq!(end.name(), "done");
    assert_eq!(end.kind(), StateKind::End);
    assert_eq!(m.into_context().words, ["open", "addressing", "with", "tombstones"]);
}

#[test_log::test]
fn empty_input_reaches_end() {
    let mut m = machine(b"");
    assert_eq!(m.run().map(State::name), Ok("done"));
    assert!(m.context().words.is_empty());
}

#[test_log::test]
fn failing_transition_stops_run() {
    let mut m = machine("caf\u{e9}".as_bytes());
    assert_eq!(m.run().err(), Some(RunError::TransitionFailed("word")));
    assert_eq!(m.context().current, "caf");
}

#[test_log::test]
fn context_is_mutable_between_runs() {
    let mut m = machine(b"a b");
    m.run().unwrap();
    m.context_mut().pos = 0;
    m.run().unwrap();
    assert_eq!(m.context().words, ["a", "b", "a", "b"]);
}
