mod common;

use common::{BAR_HEIGHT, Call, FRAME, MockDriver, content, started_frame, started_frame_with};
use tabframe::drivers::XEmbedMessage;
use tabframe::layout::TabSlot;

#[test]
fn start_shows_empty_frame() {
    let frame = started_frame();
    let driver = frame.driver();
    assert!(frame.running());
    assert!(frame.registry().is_empty());
    assert_eq!(driver.count(&Call::GrabKeys(FRAME)), 1);
    assert_eq!(driver.last_title(), Some("tabframe"));
    assert_eq!(driver.count(&Call::Raise(FRAME)), 1);
    assert!(driver.calls.iter().any(|c| matches!(c, Call::Present(_))));
}

#[test]
fn add_rotate_move_remove_scenario() {
    let mut frame = started_frame();
    assert!(frame.add(100).unwrap());
    assert!(frame.add(200).unwrap());
    assert!(frame.add(300).unwrap());
    assert_eq!(frame.registry().handles(), vec![300, 200, 100]);
    assert_eq!(frame.registry().selected(), Some(300));

    frame.rotate(1).unwrap();
    assert_eq!(frame.registry().selected(), Some(200));

    frame.move_to_index(3).unwrap();
    assert_eq!(frame.registry().selected(), Some(100));

    assert!(frame.remove(100).unwrap());
    assert_eq!(frame.registry().selected(), Some(200));
    assert_eq!(frame.registry().handles(), vec![300, 200]);
}

#[test]
fn rotate_is_inverse_with_two_or_more_tabs() {
    let mut frame = started_frame();
    for w in [10, 20, 30, 40] {
        frame.add(w).unwrap();
    }
    for start in [10, 20, 30, 40] {
        frame.focus(Some(start)).unwrap();
        frame.rotate(1).unwrap();
        frame.rotate(-1).unwrap();
        assert_eq!(frame.registry().selected(), Some(start));
    }
}

#[test]
fn toggle_returns_to_previous_selection() {
    let mut frame = started_frame();
    frame.add(10).unwrap();
    frame.add(20).unwrap();
    frame.add(30).unwrap();
    frame.move_to_index(3).unwrap();
    assert_eq!(frame.registry().selected(), Some(10));
    frame.rotate(0).unwrap();
    assert_eq!(frame.registry().selected(), Some(30));
    frame.rotate(0).unwrap();
    assert_eq!(frame.registry().selected(), Some(10));
}

#[test]
fn single_tab_rotation_refocuses_it() {
    let mut frame = started_frame();
    frame.add(7).unwrap();
    frame.driver_mut().take_calls();
    for direction in [1, -1, 0] {
        frame.rotate(direction).unwrap();
        assert_eq!(frame.registry().selected(), Some(7));
    }
    assert_eq!(frame.driver().count(&Call::Raise(7)), 3);
}

#[test]
fn out_of_range_move_is_ignored() {
    let mut frame = started_frame();
    frame.add(10).unwrap();
    frame.add(20).unwrap();
    frame.driver_mut().take_calls();
    frame.move_to_index(0).unwrap();
    frame.move_to_index(3).unwrap();
    assert_eq!(frame.registry().selected(), Some(20));
    assert!(frame.driver().calls.is_empty());
}

#[test]
fn small_ids_are_ordinary_clients() {
    let mut frame = started_frame();
    for w in [1, 2, 3] {
        assert!(frame.add(w).unwrap());
    }
    assert_eq!(frame.registry().handles(), vec![3, 2, 1]);
    assert!(!frame.registry().contains(FRAME));
}

#[test]
fn duplicate_and_self_adds_are_ignored() {
    let mut frame = started_frame();
    assert!(frame.add(42).unwrap());
    frame.driver_mut().take_calls();
    assert!(!frame.add(42).unwrap());
    assert!(!frame.add(FRAME).unwrap());
    assert_eq!(frame.registry().len(), 1);
    assert!(frame.driver().calls.is_empty());
}

#[test]
fn embedding_handshake_order() {
    let mut frame = started_frame();
    frame.add(100).unwrap();
    let driver = frame.driver();
    assert_eq!(
        driver.xembed_to(100),
        vec![
            XEmbedMessage::EmbeddedNotify,
            XEmbedMessage::WindowActivate,
            XEmbedMessage::FocusIn
        ]
    );
    assert!(
        driver
            .calls
            .contains(&Call::XEmbed(100, XEmbedMessage::EmbeddedNotify, 0, FRAME, 0))
    );
    assert!(driver.calls.contains(&Call::Reparent(100, content())));
    assert_eq!(driver.count(&Call::GrabKeys(100)), 1);
    assert_eq!(driver.count(&Call::Map(100)), 1);
    assert!(driver.calls.contains(&Call::MoveResize(100, content())));
    assert!(driver.calls.contains(&Call::FocusInput(100)));
}

#[test]
fn previous_selection_gets_no_deactivation() {
    let mut frame = started_frame();
    frame.add(1000).unwrap();
    frame.add(2000).unwrap();
    let sent = frame.driver().xembed_to(1000);
    assert!(!sent.contains(&XEmbedMessage::WindowDeactivate));
    assert!(!sent.contains(&XEmbedMessage::FocusOut));
}

#[test]
fn titles_follow_selection() {
    let mut driver = MockDriver::new();
    driver.titles.insert(100, "first page".to_string());
    let mut frame = started_frame_with(driver);
    frame.add(100).unwrap();
    assert_eq!(frame.driver().last_title(), Some("first page"));
    frame.add(200).unwrap();
    // untitled windows show their id
    assert_eq!(frame.driver().last_title(), Some("200"));
    assert_eq!(frame.find(100).unwrap().title.as_str(), "first page");
}

#[test]
fn removing_last_tab_restores_default_title() {
    let mut frame = started_frame();
    frame.add(5).unwrap();
    frame.driver_mut().take_calls();
    frame.remove(5).unwrap();
    assert_eq!(frame.registry().selected(), None);
    assert_eq!(frame.driver().last_title(), Some("tabframe"));
    assert!(frame.driver().calls.contains(&Call::Raise(FRAME)));
    assert!(!frame.remove(5).unwrap());
}

#[test]
fn removing_unselected_tab_keeps_selection() {
    let mut frame = started_frame();
    frame.add(1).unwrap();
    frame.add(2).unwrap();
    frame.remove(1).unwrap();
    assert_eq!(frame.registry().selected(), Some(2));
}

#[test]
fn background_spawn_keeps_current_tab() {
    let mut frame = started_frame();
    frame.add(100).unwrap();
    frame.spawn(&["true".to_string()], false);
    assert_eq!(frame.listener_count(), 1);
    frame.driver_mut().take_calls();

    frame.add(200).unwrap();
    assert_eq!(frame.registry().selected(), Some(100));
    assert_eq!(frame.registry().handles(), vec![200, 100]);
    assert!(frame.driver().calls.contains(&Call::Raise(100)));
    assert!(frame.driver().xembed_to(200) == vec![XEmbedMessage::EmbeddedNotify]);

    // the flag is one-shot
    frame.add(300).unwrap();
    assert_eq!(frame.registry().selected(), Some(300));
}

#[test]
fn failed_spawn_adds_no_listener() {
    let mut frame = started_frame();
    frame.spawn(&["/nonexistent/tabframe-spawn".to_string()], true);
    frame.spawn(&[], true);
    assert_eq!(frame.listener_count(), 0);
}

#[test]
fn bar_records_slots_and_paints_selected() {
    let mut frame = started_frame();
    frame.add(1).unwrap();
    frame.add(2).unwrap();
    frame.add(3).unwrap();
    let slots: Vec<_> = frame.registry().iter().map(|c| c.tab_slot).collect();
    assert_eq!(
        slots,
        vec![
            Some(TabSlot::new(0, 200)),
            Some(TabSlot::new(200, 200)),
            Some(TabSlot::new(400, 200)),
        ]
    );
    frame.driver_mut().take_calls();
    frame.draw_bar().unwrap();
    assert_eq!(frame.driver().drawn_labels(), vec!["3", "2", "1"]);
    let selected_draws: Vec<_> = frame
        .driver()
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::Draw(rect, tabframe::theme::ColorScheme::Selected, label) => {
                Some((rect.x, label.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(selected_draws, vec![(0, "3".to_string())]);
    assert!(
        frame
            .driver()
            .calls
            .contains(&Call::Present(tabframe::layout::Rect::new(0, 0, 800, BAR_HEIGHT)))
    );
}

#[test]
fn overflowing_bar_scrolls_to_selection() {
    let mut frame = started_frame();
    for w in 1..=10 {
        frame.add(w).unwrap();
    }
    // list is [10, 9, ..., 1]; select the last one
    frame.move_to_index(10).unwrap();
    let selected = frame.find(1).unwrap().tab_slot.expect("selected tab visible");
    assert!(selected.end() <= 800);
    assert!(frame.find(10).unwrap().tab_slot.is_none());
    assert!(frame.bar().more_before.is_some());
    assert!(frame.bar().more_after.is_none());
    let labels = frame.driver().drawn_labels();
    assert!(labels.contains(&"<".to_string()));
}

#[test]
fn teardown_releases_every_client() {
    let mut frame = started_frame();
    frame.add(1).unwrap();
    frame.add(2).unwrap();
    frame.teardown().unwrap();
    assert!(!frame.running());
    assert!(frame.driver().calls.contains(&Call::Release(vec![2, 1])));
}
