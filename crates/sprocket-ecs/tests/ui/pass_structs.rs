//! Named, tuple and unit structs derive Component.

use sprocket_ecs::{Component, World};

#[derive(Component, Clone, Debug)]
struct Position {
    x: i64,
    y: i64,
}

#[derive(Component, Clone, Debug)]
struct Health(u32);

#[derive(Component, Clone, Debug)]
struct Player;

#[derive(Component, Clone, Debug)]
struct Inventory {
    slots: [Option<u16>; 9],
    owner: (u64, String),
}

fn main() {
    let world = World::<()>::new();
    let entity = world.create_entity((
        Position { x: 1, y: 2 },
        Health(20),
        Player,
        Inventory {
            slots: [None; 9],
            owner: (7, String::from("steve")),
        },
    ));
    assert!(world.has_component::<Inventory>(entity));
}
