//! Behavioural tests for log subscriptions over the command socket.

use std::cell::RefCell;
use std::time::Duration;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use super::support::{ServerWorld, eventually};

#[fixture]
fn world() -> RefCell<ServerWorld> {
    RefCell::new(ServerWorld::with_history(100))
}

fn split_lines(lines: &str) -> Vec<String> {
    lines.split(',').map(str::to_owned).collect()
}

#[given("a running command server keeping {history} history lines")]
fn given_server_with_history(world: &RefCell<ServerWorld>, history: usize) {
    *world.borrow_mut() = ServerWorld::with_history(history);
    world.borrow_mut().start();
    assert!(world.borrow().start_error.is_none(), "server failed to start");
}

#[given("the lines \"{lines}\" were published")]
fn given_published(world: &RefCell<ServerWorld>, lines: String) {
    for line in split_lines(&lines) {
        world.borrow().server.publish(&line);
    }
}

#[when("a log client subscribes")]
fn when_client_subscribes(world: &RefCell<ServerWorld>) {
    world.borrow_mut().subscribe();
    let bus = world.borrow().server.bus().clone();
    assert!(eventually(Duration::from_secs(2), || {
        bus.subscriber_count() == 1
    }));
}

#[when("the line \"{line}\" is published")]
fn when_line_published(world: &RefCell<ServerWorld>, line: String) {
    world.borrow().server.publish(&line);
}

#[then("the log client receives the lines \"{lines}\"")]
fn then_client_receives(world: &RefCell<ServerWorld>, lines: String) {
    let expected = split_lines(&lines);
    let received = world.borrow_mut().read_lines(expected.len());
    assert_eq!(received, expected);
}

#[then("no log subscribers remain")]
fn then_no_subscribers(world: &RefCell<ServerWorld>) {
    let bus = world.borrow().server.bus().clone();
    assert!(eventually(Duration::from_secs(2), || {
        bus.subscriber_count() == 0
    }));
}

#[scenario(path = "tests/features/log_streaming.feature", index = 0)]
fn history_then_live_lines(world: RefCell<ServerWorld>) {
    let _ = world;
}

#[scenario(path = "tests/features/log_streaming.feature", index = 1)]
fn history_keeps_newest_lines(world: RefCell<ServerWorld>) {
    let _ = world;
}

#[scenario(path = "tests/features/log_streaming.feature", index = 2)]
fn subscribers_leave_when_server_closes(world: RefCell<ServerWorld>) {
    let _ = world;
}
