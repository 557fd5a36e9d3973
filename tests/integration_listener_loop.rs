mod common;

use std::io::{Seek, SeekFrom, Write};
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::net::UnixStream;

use common::{MockDriver, started_frame, started_frame_with};
use tabframe::event_loop::{EventLoop, wait_readable};
use tabframe::listener::{Listener, ListenerSource, ReadOutcome};
use tabframe::spawn::spawn;

#[test]
fn listener_lines_become_tabs_in_order() {
    let mut frame = started_frame();
    let (mut tx, rx) = UnixStream::pair().unwrap();
    let fd = rx.as_raw_fd();
    frame.add_listener(Listener::new(ListenerSource::Stdin, OwnedFd::from(rx)));

    tx.write_all(b"42\n7\n0\na").unwrap();
    frame.drain_listeners(&[fd]).unwrap();
    tx.write_all(b"bc\n99").unwrap();
    frame.drain_listeners(&[fd]).unwrap();
    assert_eq!(frame.registry().handles(), vec![7, 42]);

    // the unterminated 99 is registered at end of file
    drop(tx);
    frame.drain_listeners(&[fd]).unwrap();
    assert_eq!(frame.registry().handles(), vec![99, 7, 42]);
    assert_eq!(frame.listener_count(), 0);
}

#[test]
fn file_backed_listener_closes_at_eof() {
    let mut file = tempfile::tempfile().unwrap();
    file.write_all(b"100\n200\n").unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    let fd = file.as_raw_fd();

    let mut frame = started_frame();
    frame.add_listener(Listener::new(ListenerSource::Stdin, OwnedFd::from(file)));
    frame.drain_listeners(&[fd]).unwrap();
    assert_eq!(frame.listener_count(), 1);
    frame.drain_listeners(&[fd]).unwrap();
    assert_eq!(frame.listener_count(), 0);
    assert_eq!(frame.registry().handles(), vec![200, 100]);
}

#[test]
fn spawned_program_announces_window() {
    let argv: Vec<String> = ["sh", "-c", "echo 123"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut listener = spawn(&argv).unwrap();
    assert!(matches!(listener.source(), ListenerSource::Child(_)));

    let mut ids = Vec::new();
    loop {
        let ready = wait_readable(&[listener.as_raw_fd()], 5_000).unwrap();
        assert!(!ready.is_empty(), "child produced no output");
        match listener.read_available() {
            ReadOutcome::Lines(found) => ids.extend(found),
            ReadOutcome::Closed(found) => {
                ids.extend(found);
                break;
            }
        }
    }
    assert_eq!(ids, vec![123]);
}

#[test]
fn event_loop_embeds_from_listener_then_quits() {
    let mut driver = MockDriver::new();
    driver.quit_after_embeds = Some(2);
    let mut frame = started_frame_with(driver);

    let (mut tx, rx) = UnixStream::pair().unwrap();
    frame.add_listener(Listener::new(ListenerSource::Stdin, OwnedFd::from(rx)));
    tx.write_all(b"300\n400\n").unwrap();

    let mut event_loop = EventLoop::new().unwrap();
    event_loop.run(&mut frame).unwrap();

    assert!(!frame.running());
    assert_eq!(frame.registry().handles(), vec![400, 300]);
    assert_eq!(frame.registry().selected(), Some(400));
}
