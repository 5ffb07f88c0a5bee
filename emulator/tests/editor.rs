use camino::Utf8Path;
use indoc::indoc;
use pretty_assertions::assert_eq;

use bitcomp_emulator::constants::ESCAPE;
use bitcomp_emulator::execution::{ExecutionConfig, InstantClock};
use bitcomp_emulator::keys::{ExitFlag, ScriptedKey, ScriptedKeys};
use bitcomp_emulator::persistence::{load, InMemoryStorage, Storage};
use bitcomp_emulator::view::{Frame, Renderer, View};
use bitcomp_emulator::{
    edit, Address, AddressSpace, Executor, MemoryBank, Peripherals, Sequencer, Session, Word,
};

#[derive(Debug, Default)]
struct CountingRenderer {
    redraws: usize,
    views: Vec<View>,
}

impl Renderer for CountingRenderer {
    fn redraw(&mut self, _frame: &Frame<'_>) {
        self.redraws += 1;
    }

    fn view_changed(&mut self, view: View) {
        self.views.push(view);
    }
}

fn editor_session(memory: MemoryBank) -> Session<Sequencer> {
    Session::new(memory, Sequencer::default(), ExitFlag::new())
}

fn run_editor(
    session: &mut Session<Sequencer>,
    storage: &mut InMemoryStorage,
    script: impl IntoIterator<Item = ScriptedKey>,
) -> Peripherals<ScriptedKeys, CountingRenderer, InstantClock> {
    let mut io = Peripherals::new(
        ScriptedKeys::new(script),
        CountingRenderer::default(),
        InstantClock::default(),
    );
    let executor = Executor::new(ExecutionConfig::default());
    edit(session, &mut io, &executor, storage).unwrap();
    io
}

fn keys(bytes: &[u8]) -> Vec<ScriptedKey> {
    bytes.iter().copied().map(ScriptedKey::Key).collect()
}

#[test]
fn flip_and_save_test() {
    let mut memory = MemoryBank::new();
    memory.set(
        Address::new(AddressSpace::Data, 0),
        Word::from_int(0b0000_0101).unwrap(),
    );
    let mut session = editor_session(memory);
    let mut storage = InMemoryStorage::default();

    // Switch to the data space, flip the first bit, save
    run_editor(&mut session, &mut storage, keys(b"t s"));

    assert_eq!(
        session.memory.get(Address::new(AddressSpace::Data, 0)).to_string(),
        "10000101"
    );
    let saved = storage.get(Utf8Path::new("saved-ram-1")).unwrap();
    assert_eq!(
        saved,
        indoc! {"
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000

            10000101
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
            00000000
        "}
    );
    assert_eq!(
        session.current_file.as_deref(),
        Some(Utf8Path::new("saved-ram-1"))
    );
    assert!(session.exit_flag().is_requested());
}

#[test]
fn run_from_editor_test() {
    let mut session = editor_session(MemoryBank::new());
    let mut storage = InMemoryStorage::default();

    // Write a word, run until the end, dismiss, then keep editing
    let mut script = keys(b"f\n");
    script.extend(std::iter::repeat(ScriptedKey::Idle).take(20));
    script.extend(keys(b" jf"));

    run_editor(&mut session, &mut storage, script);

    assert_eq!(session.executions, 1);
    // The key dismissing the run is not seen by the editor
    assert_eq!(
        session.memory.get(Address::new(AddressSpace::Code, 0)).to_string(),
        "10000000"
    );
    assert_eq!(
        session.memory.get(Address::new(AddressSpace::Code, 1)).to_string(),
        "01000000"
    );
    assert_eq!(session.processor, Sequencer::default());
}

#[test]
fn cancel_run_from_editor_test() {
    let mut session = editor_session(MemoryBank::new());
    let mut storage = InMemoryStorage::default();

    let script = [
        ScriptedKey::Key(b'\n'),
        ScriptedKey::Idle,
        ScriptedKey::Key(ESCAPE),
        ScriptedKey::Key(b'f'),
    ];
    run_editor(&mut session, &mut storage, script);

    assert_eq!(session.executions, 1);
    assert_eq!(
        session.memory.get(Address::new(AddressSpace::Code, 0)).to_string(),
        "10000000"
    );
}

#[test]
fn save_to_current_file_test() {
    let mut storage = InMemoryStorage::default();
    let mut session = editor_session(MemoryBank::new()).with_current_file("program".into());

    // Escape leaves the number insertion without being dispatched
    run_editor(&mut session, &mut storage, keys(&[b't', b'I', b'4', b'2', ESCAPE, b'S']));

    let loaded = load(&storage, Utf8Path::new("program")).unwrap();
    assert_eq!(loaded.get(Address::new(AddressSpace::Data, 0)).to_int(), 42);
    assert!(!storage.exists(Utf8Path::new("saved-ram-1")));
}

#[test]
fn switch_view_test() {
    let mut storage = InMemoryStorage::default();
    let mut session = editor_session(MemoryBank::new()).with_view(View::Compact2D);

    let io = run_editor(&mut session, &mut storage, keys(b"vv"));

    assert_eq!(session.view, View::Full3DAlt);
    assert_eq!(io.renderer.views, vec![View::Full3D, View::Full3DAlt]);
    // The initial frame, then one per key
    assert_eq!(io.renderer.redraws, 3);
}

#[test]
fn interrupt_redraws_test() {
    let mut storage = InMemoryStorage::default();
    let mut session = editor_session(MemoryBank::new());

    let io = run_editor(
        &mut session,
        &mut storage,
        [ScriptedKey::Interrupt, ScriptedKey::Key(b'j')],
    );

    assert_eq!(io.renderer.redraws, 3);
    assert_eq!(session.cursor.word_index(), 1);
}

#[test]
fn exit_requested_before_a_key_test() {
    let mut storage = InMemoryStorage::default();
    let mut session = editor_session(MemoryBank::new());
    session.exit_flag().request();

    let io = run_editor(&mut session, &mut storage, keys(b"f"));

    // The key stays unread, nothing gets written
    assert_eq!(io.keys.remaining(), 1);
    assert_eq!(session.memory, MemoryBank::new());
    assert_eq!(io.renderer.redraws, 1);
}
