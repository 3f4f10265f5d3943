//! Enums, with or without data, derive Component.

use sprocket_ecs::Component;

#[derive(Component, Clone, Copy)]
enum Team {
    Red,
    Blue,
}

#[derive(Component, Clone)]
enum Action {
    Idle,
    Move { dx: i32, dy: i32 },
    Say(String),
}

fn assert_component<T: Component>() {}

fn main() {
    assert_component::<Team>();
    assert_component::<Action>();
}
