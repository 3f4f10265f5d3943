//! Property-based tests for entity allocation and component lifetime.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use sprocket_ecs::{ComponentKind, EcsError, EntityId, World, prelude::Component};

#[derive(Component, Clone, Debug, PartialEq)]
struct Mass(u32);

#[derive(Component, Clone, Debug, PartialEq)]
struct Label(String);

#[derive(Component, Clone, Debug, PartialEq)]
struct Marker;

/// One step of a random world workload.
#[derive(Debug, Clone)]
enum Op {
    Create,
    CreateWith(u32),
    Delete(usize),
    Attach(usize, u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Create),
        any::<u32>().prop_map(Op::CreateWith),
        any::<usize>().prop_map(Op::Delete),
        (any::<usize>(), any::<u32>()).prop_map(|(idx, mass)| Op::Attach(idx, mass)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Created IDs are strictly increasing, whatever happens in between.
    #[test]
    fn prop_ids_strictly_increase(ops in prop::collection::vec(op(), 1..64)) {
        let world = World::<()>::new();
        let mut created: Vec<EntityId> = Vec::new();

        for op in ops {
            match op {
                Op::Create => created.push(world.create_entity(())),
                Op::CreateWith(mass) => created.push(world.create_entity(Mass(mass))),
                Op::Delete(idx) if !created.is_empty() => {
                    world.delete_entity(created[idx % created.len()]);
                }
                Op::Attach(idx, mass) if !created.is_empty() => {
                    let _ = world.add_components(created[idx % created.len()], Mass(mass));
                }
                Op::Delete(_) | Op::Attach(..) => {}
            }
        }

        prop_assert!(created.windows(2).all(|pair| pair[0] < pair[1]));
    }

    /// A deleted entity reports no component of any kind it used to carry.
    #[test]
    fn prop_deleted_entity_has_nothing(
        mass in any::<u32>(),
        label in "[a-z]{0,12}",
        with_marker in any::<bool>(),
        neighbours in 0usize..8,
    ) {
        let world = World::<()>::new();
        for i in 0..neighbours {
            world.create_entity(Mass(u32::try_from(i).unwrap()));
        }

        let entity = world.create_entity((Mass(mass), Label(label)));
        if with_marker {
            world.add_components(entity, Marker).unwrap();
        }
        let kinds = world.kinds_of(entity);

        prop_assert!(world.delete_entity(entity));

        prop_assert!(world.get_component::<Mass>(entity).is_none());
        prop_assert!(world.get_component::<Label>(entity).is_none());
        prop_assert!(world.get_component::<Marker>(entity).is_none());
        prop_assert!(world.kinds_of(entity).is_empty());
        prop_assert_eq!(kinds.contains(&ComponentKind::of::<Marker>()), with_marker);
        prop_assert_eq!(world.component_count::<Mass>(), neighbours);
    }

    /// Attaching to an entity that is not live fails and leaves the store untouched.
    #[test]
    fn prop_attach_to_dead_entity_fails(
        live in 0usize..8,
        raw in any::<u64>(),
        mass in any::<u32>(),
    ) {
        let world = World::<()>::new();
        let entities: Vec<_> = (0..live)
            .map(|i| world.create_entity(Mass(u32::try_from(i).unwrap())))
            .collect();
        let ghost = EntityId::from_raw(raw);
        prop_assume!(!entities.contains(&ghost));

        let before = world.get_components::<Mass>();
        let result = world.add_components(ghost, (Mass(mass), Marker));

        prop_assert_eq!(result, Err(EcsError::UnknownEntity(ghost)));
        prop_assert_eq!(world.get_components::<Mass>(), before);
        prop_assert!(world.get_components::<Marker>().is_empty());
        prop_assert!(!world.is_alive(ghost));
    }
}
