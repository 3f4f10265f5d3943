//! Generic components carry their bounds into the impl.

use sprocket_ecs::{Component, EntityId};

#[derive(Component, Clone)]
struct Tagged<T>
where
    T: Clone + Send + Sync + 'static,
{
    value: T,
}

#[derive(Component, Clone)]
struct Target<const N: usize> {
    entities: [Option<EntityId>; N],
}

fn assert_component<T: Component>() {}

fn main() {
    assert_component::<Tagged<u8>>();
    assert_component::<Tagged<Vec<String>>>();
    assert_component::<Target<4>>();
}
