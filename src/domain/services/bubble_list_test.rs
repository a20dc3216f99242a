use super::BubbleList;
use crate::domain::models::Message;
use crate::domain::models::Role;

fn messages() -> Vec<Message> {
    return vec![
        Message::user("Value Acme", 1),
        Message::new(Role::Agent, "Working on it.\nLoading statements.", 2),
    ];
}

#[test]
fn it_has_no_cached_lines() {
    let bubble_list = BubbleList::new("You", "analyst");

    assert_eq!(bubble_list.cache.len(), 0);
    assert_eq!(bubble_list.len(), 0);
}

#[test]
fn it_caches_lines() {
    let mut bubble_list = BubbleList::new("You", "analyst");
    bubble_list.set_messages(&messages(), 50);

    assert_eq!(bubble_list.cache.len(), 2);
}

#[test]
fn it_returns_correct_length() {
    let mut bubble_list = BubbleList::new("You", "analyst");
    bubble_list.set_messages(&messages(), 50);

    // 3 lines for the user bubble, 4 for the agent bubble.
    assert_eq!(bubble_list.len(), 7);
}

#[test]
fn it_rebuilds_changed_messages() {
    let mut bubble_list = BubbleList::new("You", "analyst");
    let mut messages = messages();
    bubble_list.set_messages(&messages, 50);

    messages[1].append("\nDone.");
    bubble_list.set_messages(&messages, 50);
    assert_eq!(bubble_list.len(), 8);

    messages.truncate(1);
    bubble_list.set_messages(&messages, 50);
    assert_eq!(bubble_list.cache.len(), 1);
    assert_eq!(bubble_list.len(), 3);
}

#[test]
fn it_keeps_rendered_lines_after_messages_are_dropped() {
    let mut bubble_list = BubbleList::new("You", "analyst");
    {
        let messages = vec![Message::new(Role::Agent, "Short lived", 1)];
        bubble_list.set_messages(&messages, 50);
    }

    let body = bubble_list.cache[&0].lines[1]
        .spans
        .iter()
        .map(|span| return span.content.to_string())
        .collect::<String>();
    assert!(body.contains("Short lived"));
}
